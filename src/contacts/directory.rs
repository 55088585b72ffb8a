//! File-backed contact directory.
//!
//! Reads a JSON export of the address book:
//!
//! ```json
//! [
//!   {
//!     "id": 12,
//!     "name": "Jane Doe",
//!     "numbers": ["+1 (555) 123-4567"],
//!     "emails": [
//!       { "address": "jane@work.example", "primary": true },
//!       { "address": "jane.doe@gmail.com" }
//!     ]
//!   }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ContactDirectory, ContactMatch};
use crate::error::{Result, SmsMimeError};

/// Minimum digits two numbers must share for a suffix match.
const MIN_MATCH_DIGITS: usize = 7;

/// One address-book entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
}

/// An email address attached to a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEmail {
    pub address: String,
    #[serde(default)]
    pub primary: bool,
}

/// An in-memory directory over a fixed list of contacts.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    contacts: Vec<Contact>,
}

impl StaticDirectory {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    /// Load contacts from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SmsMimeError::FileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path).map_err(|e| SmsMimeError::io(path, e))?;
        let contacts: Vec<Contact> =
            serde_json::from_slice(&data).map_err(|e| SmsMimeError::InvalidDirectory {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), count = contacts.len(), "Loaded contacts");
        Ok(Self::new(contacts))
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

impl ContactDirectory for StaticDirectory {
    fn lookup_phone(&self, address: &str) -> Result<Option<ContactMatch>> {
        let wanted = digits(address);
        if wanted.is_empty() {
            return Ok(None);
        }
        for contact in &self.contacts {
            if let Some(number) = contact
                .numbers
                .iter()
                .find(|n| numbers_match(&wanted, &digits(n)))
            {
                return Ok(Some(ContactMatch {
                    person_id: contact.id,
                    name: contact.name.clone(),
                    number: Some(number.clone()),
                }));
            }
        }
        Ok(None)
    }

    fn emails_for(&self, person_id: i64) -> Result<Vec<String>> {
        let Some(contact) = self.contacts.iter().find(|c| c.id == person_id) else {
            return Ok(Vec::new());
        };
        let mut emails: Vec<&ContactEmail> = contact.emails.iter().collect();
        // stable: keeps file order within each group
        emails.sort_by_key(|e| !e.primary);
        Ok(emails.into_iter().map(|e| e.address.clone()).collect())
    }
}

/// Strip a phone number down to its digits.
fn digits(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Two numbers match if their digits are equal, or if the shorter one is a
/// suffix of the longer and long enough to be meaningful (country and
/// trunk prefixes differ between stores).
fn numbers_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.len() >= MIN_MATCH_DIGITS && long.ends_with(short)
}
