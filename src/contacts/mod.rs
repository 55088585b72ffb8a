//! Contact resolution: directory lookups, the person cache, and the resolver.
//!
//! The directory is an external service. This module only depends on its
//! query contract ([`ContactDirectory`]); [`directory::StaticDirectory`] is a
//! file-backed implementation used by the CLI and tests.

pub mod cache;
pub mod directory;
pub mod resolver;

use crate::error::Result;

/// A directory entry matching a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMatch {
    /// Directory-assigned id. Non-positive ids have no email entries.
    pub person_id: i64,
    /// Contact name, if the directory has one.
    pub name: Option<String>,
    /// The number as stored in the directory.
    pub number: Option<String>,
}

/// Query contract of the contact directory.
pub trait ContactDirectory {
    /// Find the contact owning a phone number. At most one match.
    fn lookup_phone(&self, address: &str) -> Result<Option<ContactMatch>>;

    /// All email addresses of a contact, primary addresses first.
    fn emails_for(&self, person_id: i64) -> Result<Vec<String>>;
}

impl<D: ContactDirectory + ?Sized> ContactDirectory for &D {
    fn lookup_phone(&self, address: &str) -> Result<Option<ContactMatch>> {
        (**self).lookup_phone(address)
    }

    fn emails_for(&self, person_id: i64) -> Result<Vec<String>> {
        (**self).emails_for(person_id)
    }
}
