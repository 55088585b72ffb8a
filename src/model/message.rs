//! Converted message types.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// Header names written on every converted message.
///
/// These names are a fixed contract: restore and de-duplication read them
/// back from the mailbox, so they must never change.
pub mod headers {
    pub const MESSAGE_ID: &str = "Message-ID";
    pub const REFERENCES: &str = "References";
    pub const ID: &str = "X-smssync-id";
    pub const ADDRESS: &str = "X-smssync-address";
    pub const TYPE: &str = "X-smssync-type";
    pub const DATE: &str = "X-smssync-date";
    pub const THREAD_ID: &str = "X-smssync-thread";
    pub const READ: &str = "X-smssync-read";
    pub const STATUS: &str = "X-smssync-status";
    pub const PROTOCOL: &str = "X-smssync-protocol";
    pub const SERVICE_CENTER: &str = "X-smssync-service_center";
    pub const BACKUP_TIME: &str = "X-smssync-backup-time";
    pub const VERSION: &str = "X-smssync-version";
}

/// A single metadata header. `None` means the source had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: &'static str,
    pub value: Option<String>,
}

/// One SMS rendered as an email message.
#[derive(Debug, Clone)]
pub struct ConvertedMessage {
    pub from: EmailAddress,
    pub to: EmailAddress,
    /// Unencoded subject text.
    pub subject: String,
    /// Plain-text body (empty if the row had none).
    pub body: String,
    /// When the SMS was sent or received. `None` if the row date was unparsable.
    pub sent_date: Option<DateTime<Utc>>,
    /// Metadata headers in their fixed order.
    pub headers: Vec<Header>,
    /// IMAP `\Seen` flag.
    pub seen: bool,
}

impl ConvertedMessage {
    /// Look up a header value by name (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .and_then(|h| h.value.as_deref())
    }

    /// The `Message-ID` header, absent when the date could not be parsed.
    pub fn message_id(&self) -> Option<&str> {
        self.header(headers::MESSAGE_ID)
    }

    /// The `References` header.
    pub fn references(&self) -> Option<&str> {
        self.header(headers::REFERENCES)
    }
}

/// Output of a batch conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    /// Highest row date seen, never below the floor passed in.
    pub max_date: i64,
    /// Converted messages, in row order.
    pub messages: Vec<ConvertedMessage>,
}
