//! Email address model (RFC 5322 §3.4).

/// An email address as it appears in a `From:` or `To:` header.
///
/// The display name is stored already encoded for the header, so
/// formatting never has to re-quote it.
///
/// # Examples
/// - `"Jane Doe <jane@example.com>"` → `display_name = "Jane Doe"`, `address = "jane@example.com"`
/// - `"+15551234567@unknown.person"` → `display_name = ""`, `address = "+15551234567@unknown.person"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Header-ready display name (may be empty).
    pub display_name: String,
    /// The bare email address (`local@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Build an address with a display name.
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Build an address without a display name.
    pub fn bare(address: impl Into<String>) -> Self {
        Self::new(String::new(), address)
    }

    /// Parse a single email address, as given in configuration.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// If parsing fails, the raw string is stored as `address`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::bare(String::new());
        }

        if let Some(angle_start) = trimmed.rfind('<') {
            if let Some(angle_end) = trimmed.rfind('>') {
                if angle_end > angle_start {
                    let addr = trimmed[angle_start + 1..angle_end].trim();
                    let name_part = trimmed[..angle_start].trim();
                    return Self::new(unquote_name(name_part), addr);
                }
            }
        }

        Self::bare(trimmed)
    }

    /// Format for a header: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

/// Keep a quoted display name quoted only when it needs to be.
///
/// `"Jane"` becomes `Jane`; `"Last, First"` stays quoted because the comma
/// is not allowed in a bare phrase.
fn unquote_name(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        let inner = trimmed[1..trimmed.len() - 1].trim();
        crate::mime::encode::encode_display_name(inner)
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
