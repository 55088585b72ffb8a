//! Message identity: thread references and content-derived Message-IDs.
//!
//! Everything here is a pure function of its inputs (token generation
//! aside), so ids come out identical on every backup run and the mail
//! server can de-duplicate re-uploaded messages.

use md5::{Digest, Md5};
use rand::Rng;

use crate::config::Preferences;

/// Domain part shared by generated Message-ID and References values.
pub const ID_DOMAIN: &str = "sms-backup-plus.local";

/// Length of a generated reference token.
pub const REFERENCE_TOKEN_LEN: usize = 24;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Return the persisted reference token, creating and storing one if needed.
pub fn reference_token<P: Preferences + ?Sized>(prefs: &mut P) -> String {
    if let Some(token) = prefs.reference_uid().filter(|t| !t.is_empty()) {
        return token;
    }
    let token = generate_reference_value();
    tracing::info!("Generated new reference token");
    prefs.set_reference_uid(&token);
    token
}

/// Generate a fresh 24-character base-36 token.
///
/// Digits are drawn from `0..35`, so `z` never appears. Existing tokens
/// were produced the same way.
pub fn generate_reference_value() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERENCE_TOKEN_LEN)
        .map(|_| BASE36_DIGITS[rng.gen_range(0..35)] as char)
        .collect()
}

/// `References` value grouping every message exchanged with one contact.
pub fn references_header(reference_token: &str, person_stable_id: &str) -> String {
    format!("<{reference_token}.{person_stable_id}@{ID_DOMAIN}>")
}

/// Deterministic Message-ID for a message sent at `sent_millis` to or from
/// `address` with store type `type_code`.
///
/// `<md5(millis ‖ address ‖ type)@sms-backup-plus.local>`, hex lowercase.
pub fn message_id(sent_millis: i64, address: &str, type_code: i32) -> String {
    message_id_raw(sent_millis, address, &type_code.to_string())
}

/// Like [`message_id`], with the type taken as text.
///
/// Used when the store's type column is not an integer, so such rows still
/// get a stable id.
pub fn message_id_raw(sent_millis: i64, address: &str, type_text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(sent_millis.to_string().as_bytes());
    hasher.update(address.as_bytes());
    hasher.update(type_text.as_bytes());
    format!("<{:x}@{ID_DOMAIN}>", hasher.finalize())
}
