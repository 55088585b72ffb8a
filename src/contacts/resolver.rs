//! Phone number → person resolution with caching and deterministic fallbacks.

use tracing::{debug, warn};

use super::cache::PersonCache;
use super::ContactDirectory;
use crate::mime::encode::{encode_display_name, encode_local_part};
use crate::model::address::EmailAddress;
use crate::model::person::PersonRecord;

/// Stand-in when a known contact has no number on record.
const UNKNOWN_NUMBER: &str = "unknown_number";
/// Domain of placeholder emails for known contacts without an email address.
const UNKNOWN_EMAIL_DOMAIN: &str = "unknown.email";
/// Domain of placeholder emails for addresses not in the directory.
const UNKNOWN_PERSON_DOMAIN: &str = "unknown.person";

/// Resolves addresses to [`PersonRecord`]s.
///
/// Never fails: directory errors are logged and treated as "no match", and
/// every address ends up with a usable record.
pub struct PersonResolver<D> {
    directory: D,
    cache: PersonCache,
}

impl<D: ContactDirectory> PersonResolver<D> {
    pub fn new(directory: D) -> Self {
        Self::with_cache(directory, PersonCache::default())
    }

    pub fn with_cache(directory: D, cache: PersonCache) -> Self {
        Self { directory, cache }
    }

    /// Resolve an address, consulting the cache first.
    pub fn resolve(&mut self, address: &str) -> PersonRecord {
        if let Some(record) = self.cache.get(address) {
            return record.clone();
        }

        let record = self.lookup(address);
        self.cache.insert(address, record.clone());
        record
    }

    pub fn cache(&self) -> &PersonCache {
        &self.cache
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    fn lookup(&self, address: &str) -> PersonRecord {
        let found = match self.directory.lookup_phone(address) {
            Ok(found) => found,
            Err(e) => {
                warn!(address = %address, error = %e, "Directory lookup failed");
                None
            }
        };

        match found {
            Some(contact) => {
                let email = self.primary_email(contact.person_id, contact.number.as_deref());
                let name = contact
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| address.to_string());
                debug!(address = %address, person_id = contact.person_id, "Resolved contact");
                let canonical = EmailAddress::new(encode_display_name(&name), email);
                PersonRecord::resolved(contact.person_id, name, canonical)
            }
            None => {
                debug!(address = %address, "Looked up unknown address");
                let canonical = EmailAddress::bare(format!(
                    "{}@{UNKNOWN_PERSON_DOMAIN}",
                    encode_local_part(address)
                ));
                PersonRecord::unknown(address, canonical)
            }
        }
    }

    /// Pick the email used for a known contact.
    ///
    /// Primary-first order from the directory; the first Gmail address wins,
    /// otherwise the first address, otherwise a placeholder.
    fn primary_email(&self, person_id: i64, number: Option<&str>) -> String {
        if person_id <= 0 {
            return unknown_email(number);
        }

        let emails = match self.directory.emails_for(person_id) {
            Ok(emails) => emails,
            Err(e) => {
                warn!(person_id, error = %e, "Email lookup failed");
                Vec::new()
            }
        };

        emails
            .iter()
            .find(|e| is_gmail_address(e))
            .or_else(|| emails.first())
            .cloned()
            .unwrap_or_else(|| unknown_email(number))
    }
}

/// Placeholder email for a known contact with no email address.
///
/// Produces `{number}@unknown.email`, where the number falls back to
/// `unknown_number`. The two-convention shape is kept as-is because
/// existing backups already carry these addresses.
pub fn unknown_email(number: Option<&str>) -> String {
    let number = number.unwrap_or(UNKNOWN_NUMBER);
    format!("{}@{UNKNOWN_EMAIL_DOMAIN}", encode_local_part(number.trim()))
}

/// Whether an email address is hosted by Gmail.
pub fn is_gmail_address(email: &str) -> bool {
    email.ends_with("gmail.com") || email.ends_with("googlemail.com")
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::contacts::directory::{Contact, ContactEmail, StaticDirectory};
    use crate::contacts::ContactMatch;
    use crate::error::{Result, SmsMimeError};

    fn email(address: &str, primary: bool) -> ContactEmail {
        ContactEmail {
            address: address.to_string(),
            primary,
        }
    }

    fn directory() -> StaticDirectory {
        StaticDirectory::new(vec![
            Contact {
                id: 1,
                name: Some("Jane Doe".to_string()),
                numbers: vec!["+15550000001".to_string()],
                emails: vec![
                    email("jane@work.example", true),
                    email("jane.doe@gmail.com", false),
                ],
            },
            Contact {
                id: 2,
                name: Some("Doe, John".to_string()),
                numbers: vec!["+15550000002".to_string()],
                emails: vec![
                    email("john@home.example", false),
                    email("john@work.example", true),
                ],
            },
            Contact {
                id: 3,
                name: Some("No Mail".to_string()),
                numbers: vec!["+1 555 000 0003".to_string()],
                emails: vec![],
            },
            Contact {
                id: 0,
                name: Some("Local".to_string()),
                numbers: vec!["+15550000004".to_string()],
                emails: vec![email("local@gmail.com", true)],
            },
        ])
    }

    /// Counts lookups so cache hits can be observed.
    struct CountingDirectory {
        inner: StaticDirectory,
        lookups: Cell<usize>,
    }

    impl ContactDirectory for CountingDirectory {
        fn lookup_phone(&self, address: &str) -> Result<Option<ContactMatch>> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.lookup_phone(address)
        }

        fn emails_for(&self, person_id: i64) -> Result<Vec<String>> {
            self.inner.emails_for(person_id)
        }
    }

    struct FailingDirectory;

    impl ContactDirectory for FailingDirectory {
        fn lookup_phone(&self, _address: &str) -> Result<Option<ContactMatch>> {
            Err(SmsMimeError::Directory("provider unavailable".to_string()))
        }

        fn emails_for(&self, _person_id: i64) -> Result<Vec<String>> {
            Err(SmsMimeError::Directory("provider unavailable".to_string()))
        }
    }

    #[test]
    fn test_unknown_address() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("+15551234567");
        assert_eq!(record.stable_id, "+15551234567");
        assert_eq!(record.display_name, "+15551234567");
        assert_eq!(
            record.canonical_address.address,
            "+15551234567@unknown.person"
        );
        assert_eq!(record.canonical_address.display_name, "");
        assert!(!record.resolved);
    }

    #[test]
    fn test_unknown_address_needing_quotes() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("My Bank");
        assert_eq!(
            record.canonical_address.address,
            "\"My Bank\"@unknown.person"
        );
    }

    #[test]
    fn test_gmail_preferred_over_primary() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("+15550000001");
        assert!(record.resolved);
        assert_eq!(record.stable_id, "1");
        assert_eq!(record.display_name, "Jane Doe");
        assert_eq!(
            record.canonical_address,
            EmailAddress::new("Jane Doe", "jane.doe@gmail.com")
        );
    }

    #[test]
    fn test_primary_first_without_gmail() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("+15550000002");
        assert_eq!(record.canonical_address.address, "john@work.example");
        assert_eq!(record.canonical_address.display_name, "\"Doe, John\"");
    }

    #[test]
    fn test_known_contact_without_email() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("+15550000003");
        assert_eq!(record.stable_id, "3");
        assert_eq!(
            record.canonical_address.address,
            "\"+1 555 000 0003\"@unknown.email"
        );
    }

    #[test]
    fn test_non_positive_person_id_uses_placeholder() {
        let mut resolver = PersonResolver::new(directory());
        let record = resolver.resolve("+15550000004");
        assert_eq!(record.stable_id, "0");
        assert_eq!(
            record.canonical_address.address,
            "+15550000004@unknown.email"
        );
    }

    #[test]
    fn test_unknown_email_fallback_token() {
        assert_eq!(unknown_email(None), "unknown_number@unknown.email");
        assert_eq!(unknown_email(Some(" 555 ")), "555@unknown.email");
    }

    #[test]
    fn test_is_gmail_address() {
        assert!(is_gmail_address("a@gmail.com"));
        assert!(is_gmail_address("a@googlemail.com"));
        assert!(!is_gmail_address("a@gmail.co"));
    }

    #[test]
    fn test_repeated_resolve_hits_cache() {
        let dir = CountingDirectory {
            inner: directory(),
            lookups: Cell::new(0),
        };
        let mut resolver = PersonResolver::new(&dir);
        let first = resolver.resolve("+15550000001");
        let second = resolver.resolve("+15550000001");
        assert_eq!(first, second);
        assert_eq!(dir.lookups.get(), 1);

        resolver.resolve("+19990000000");
        resolver.resolve("+19990000000");
        assert_eq!(dir.lookups.get(), 2);
    }

    #[test]
    fn test_eviction_forces_new_lookup() {
        let dir = CountingDirectory {
            inner: directory(),
            lookups: Cell::new(0),
        };
        let mut resolver = PersonResolver::with_cache(&dir, PersonCache::new(2));
        resolver.resolve("a");
        resolver.resolve("b");
        resolver.resolve("a");
        resolver.resolve("c"); // evicts "b"
        assert_eq!(resolver.cache().len(), 2);
        assert_eq!(dir.lookups.get(), 3);

        resolver.resolve("a");
        assert_eq!(dir.lookups.get(), 3);
        resolver.resolve("b");
        assert_eq!(dir.lookups.get(), 4);
    }

    #[test]
    fn test_directory_failure_is_no_match() {
        let mut resolver = PersonResolver::new(FailingDirectory);
        let record = resolver.resolve("+15551234567");
        assert!(!record.resolved);
        assert_eq!(
            record.canonical_address.address,
            "+15551234567@unknown.person"
        );
    }
}
