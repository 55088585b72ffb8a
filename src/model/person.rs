//! Resolved contact identities.

use super::address::EmailAddress;

/// Identity attached to one phone-number-like address.
///
/// `stable_id` feeds the `References` header, so every message to or from
/// the same contact threads together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// Directory id for known contacts, the raw address for unknown ones.
    pub stable_id: String,
    /// Name used in the subject line.
    pub display_name: String,
    /// Address used in `From:`/`To:`.
    pub canonical_address: EmailAddress,
    /// Whether the directory knew this address.
    pub resolved: bool,
}

impl PersonRecord {
    /// A contact found in the directory.
    pub fn resolved(
        id: i64,
        display_name: impl Into<String>,
        canonical_address: EmailAddress,
    ) -> Self {
        Self {
            stable_id: id.to_string(),
            display_name: display_name.into(),
            canonical_address,
            resolved: true,
        }
    }

    /// An address with no directory match.
    pub fn unknown(address: &str, canonical_address: EmailAddress) -> Self {
        Self {
            stable_id: address.to_string(),
            display_name: address.to_string(),
            canonical_address,
            resolved: false,
        }
    }
}
