//! Render converted messages as RFC 5322 text and write them as `.eml` files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::mime::encode::encode_unstructured;
use crate::model::message::ConvertedMessage;

/// Render a message with CRLF line endings, ready for upload or `.eml`.
pub fn render_message(message: &ConvertedMessage) -> String {
    render(message, "\r\n")
}

/// Render a message with the given line ending.
///
/// Headers absent from the source row are omitted rather than written empty.
/// The seen flag is carried as the mbox-style `Status` header (`RO` read,
/// `O` unread).
pub(crate) fn render(message: &ConvertedMessage, eol: &str) -> String {
    let mut out = String::with_capacity(512 + message.body.len());

    push_header(&mut out, "From", &message.from.display(), eol);
    push_header(&mut out, "To", &message.to.display(), eol);
    push_header(&mut out, "Subject", &encode_unstructured(&message.subject), eol);
    if let Some(date) = message.sent_date {
        push_header(&mut out, "Date", &date.to_rfc2822(), eol);
    }
    push_header(&mut out, "MIME-Version", "1.0", eol);
    push_header(&mut out, "Content-Type", "text/plain; charset=utf-8", eol);
    push_header(&mut out, "Content-Transfer-Encoding", "8bit", eol);
    push_header(&mut out, "Status", status_flag(message.seen), eol);
    for header in &message.headers {
        if let Some(ref value) = header.value {
            push_header(&mut out, header.name, value, eol);
        }
    }
    out.push_str(eol);

    for (i, line) in message.body.lines().enumerate() {
        if i > 0 {
            out.push_str(eol);
        }
        out.push_str(line);
    }
    out.push_str(eol);
    out
}

fn status_flag(seen: bool) -> &'static str {
    if seen {
        "RO"
    } else {
        "O"
    }
}

/// Append `Name: value`, flattening any line breaks in the value.
fn push_header(out: &mut String, name: &str, value: &str, eol: &str) {
    out.push_str(name);
    out.push_str(": ");
    for c in value.chars() {
        out.push(if c == '\r' || c == '\n' { ' ' } else { c });
    }
    out.push_str(eol);
}

/// Write each message to its own `.eml` file in `output_dir`.
///
/// The progress callback receives `(current, total)`.
pub fn export_eml(
    messages: &[ConvertedMessage],
    output_dir: &Path,
    progress: &dyn Fn(usize, usize),
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut paths = Vec::with_capacity(messages.len());
    let mut used: HashSet<String> = HashSet::new();
    let total = messages.len();

    for (i, message) in messages.iter().enumerate() {
        progress(i, total);
        let mut filename = eml_filename(message, i);
        if !used.insert(filename.clone()) {
            filename = format!("{}_{i}.eml", filename.trim_end_matches(".eml"));
            used.insert(filename.clone());
        }
        let path = output_dir.join(&filename);
        std::fs::write(&path, render_message(message))?;
        paths.push(path);
    }
    progress(total, total);

    tracing::info!(dir = %output_dir.display(), count = paths.len(), "Exported EML files");
    Ok(paths)
}

/// Generate a file name for a message.
///
/// Format: `{date}_{address}_{id}.eml`, where `id` is the start of the
/// Message-ID digest (stable across runs) or the sequence number when the
/// message has no date.
fn eml_filename(message: &ConvertedMessage, sequence: usize) -> String {
    let date = message
        .sent_date
        .map(|d| d.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|| "nodate".to_string());
    let address = sanitize_filename_part(
        message.header(crate::model::message::headers::ADDRESS).unwrap_or(""),
        30,
    );
    let id = message
        .message_id()
        .map(|id| id.trim_start_matches('<').chars().take(12).collect::<String>())
        .unwrap_or_else(|| format!("{sequence:06}"));

    format!("{date}_{address}_{id}.eml")
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '+' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}
