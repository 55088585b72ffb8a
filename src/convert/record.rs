//! Conversion of a single message-store row.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::identity::{message_id_raw, reference_token, references_header};
use crate::config::Preferences;
use crate::contacts::cache::PersonCache;
use crate::contacts::resolver::PersonResolver;
use crate::contacts::ContactDirectory;
use crate::model::address::EmailAddress;
use crate::model::message::{headers, ConvertedMessage, Header};
use crate::model::row::{columns, Row};

/// Type codes used by the SMS store.
pub mod message_type {
    pub const INBOX: i32 = 1;
    pub const SENT: i32 = 2;
    pub const DRAFT: i32 = 3;
    pub const OUTBOX: i32 = 4;
    pub const FAILED: i32 = 5;
    pub const QUEUED: i32 = 6;
}

/// Which way a message went, as far as the envelope is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    /// Delivered to the device owner: from the contact, to the user.
    Received,
    /// Everything else: from the user, to the contact.
    Sent,
}

impl MessageDirection {
    /// Classify a store type code.
    ///
    /// Only [`message_type::INBOX`] is `Received`. Sent, draft, outbox,
    /// failed and queued messages, unknown codes, and a missing or
    /// non-numeric code all default to `Sent`.
    pub fn from_type_code(code: Option<i32>) -> Self {
        match code {
            Some(message_type::INBOX) => Self::Received,
            _ => Self::Sent,
        }
    }
}

/// Immutable per-run settings for conversion.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// The device owner's address.
    pub user_address: EmailAddress,
    /// Token shared by all `References` headers of this installation.
    pub reference_token: String,
    /// Value of the `\Seen` flag on every converted message.
    pub mark_as_read: bool,
    /// Written to `X-smssync-version`.
    pub version: String,
}

impl ConversionContext {
    pub fn new(
        user_address: EmailAddress,
        reference_token: impl Into<String>,
        mark_as_read: bool,
        version: impl Into<String>,
    ) -> Self {
        Self {
            user_address,
            reference_token: reference_token.into(),
            mark_as_read,
            version: version.into(),
        }
    }

    /// Build a context from stored preferences, creating the reference
    /// token on first use.
    pub fn from_preferences<P: Preferences + ?Sized>(user_email: &str, prefs: &mut P) -> Self {
        let token = reference_token(prefs);
        Self::new(
            EmailAddress::parse(user_email),
            token,
            prefs.mark_as_read(),
            prefs.version(),
        )
    }
}

/// Turns rows into messages, resolving contacts through a cached directory.
pub struct RecordConverter<D> {
    context: ConversionContext,
    resolver: PersonResolver<D>,
}

impl<D: ContactDirectory> RecordConverter<D> {
    pub fn new(context: ConversionContext, directory: D) -> Self {
        Self::with_resolver(context, PersonResolver::new(directory))
    }

    pub fn with_cache_size(context: ConversionContext, directory: D, cache_size: usize) -> Self {
        Self::with_resolver(
            context,
            PersonResolver::with_cache(directory, PersonCache::new(cache_size)),
        )
    }

    pub fn with_resolver(context: ConversionContext, resolver: PersonResolver<D>) -> Self {
        Self { context, resolver }
    }

    pub fn context(&self) -> &ConversionContext {
        &self.context
    }

    pub fn resolver(&self) -> &PersonResolver<D> {
        &self.resolver
    }

    /// Convert one row.
    ///
    /// Returns `None` only when the row has no usable address. A date that
    /// does not parse leaves the date and `Message-ID` unset but still yields
    /// a message. A parsed date outside the calendar range keeps its
    /// `Message-ID` and only loses the `Date` header.
    pub fn convert(&mut self, row: &Row) -> Option<ConvertedMessage> {
        let Some(address) = row.address() else {
            warn!(id = row.get(columns::ID).unwrap_or(""), "Skipping row without address");
            return None;
        };

        let person = self.resolver.resolve(address);

        let type_code = row.type_code();
        if type_code.is_none() {
            warn!(
                address = %address,
                value = row.get(columns::TYPE).unwrap_or(""),
                "Unparsable message type, treating as sent"
            );
        }

        let (from, to) = match MessageDirection::from_type_code(type_code) {
            MessageDirection::Received => {
                (person.canonical_address.clone(), self.context.user_address.clone())
            }
            MessageDirection::Sent => {
                (self.context.user_address.clone(), person.canonical_address.clone())
            }
        };

        let millis = row.date_millis();
        let sent_date = millis.and_then(DateTime::from_timestamp_millis);
        if sent_date.is_none() {
            warn!(value = row.get(columns::DATE).unwrap_or(""), "Error parsing date");
        }
        let message_id = millis.map(|millis| {
            let type_text = match type_code {
                Some(code) => code.to_string(),
                None => row.get(columns::TYPE).unwrap_or("").trim().to_string(),
            };
            message_id_raw(millis, address, &type_text)
        });

        let field = |column: &str| row.get(column).map(str::to_string);
        let metadata = vec![
            header(headers::ID, field(columns::ID)),
            header(headers::ADDRESS, Some(address.to_string())),
            header(headers::TYPE, field(columns::TYPE)),
            header(headers::DATE, field(columns::DATE)),
            header(headers::THREAD_ID, field(columns::THREAD_ID)),
            header(headers::READ, field(columns::READ)),
            header(headers::STATUS, field(columns::STATUS)),
            header(headers::PROTOCOL, field(columns::PROTOCOL)),
            header(headers::SERVICE_CENTER, field(columns::SERVICE_CENTER)),
            header(headers::BACKUP_TIME, Some(backup_time(Utc::now()))),
            header(headers::VERSION, Some(self.context.version.clone())),
            header(headers::MESSAGE_ID, message_id),
            // Threaded by contact rather than the store's thread id, which
            // is not stable across devices or restores.
            header(
                headers::REFERENCES,
                Some(references_header(
                    &self.context.reference_token,
                    &person.stable_id,
                )),
            ),
        ];

        Some(ConvertedMessage {
            from,
            to,
            subject: format!("SMS with {}", person.display_name),
            body: row.get(columns::BODY).unwrap_or_default().to_string(),
            sent_date,
            headers: metadata,
            seen: self.context.mark_as_read,
        })
    }
}

fn header(name: &'static str, value: Option<String>) -> Header {
    Header { name, value }
}

/// Backup timestamp in the legacy `toGMTString` layout, e.g. `1 Jan 2010 00:00:00 GMT`.
pub fn backup_time(now: DateTime<Utc>) -> String {
    now.format("%-d %b %Y %H:%M:%S GMT").to_string()
}
