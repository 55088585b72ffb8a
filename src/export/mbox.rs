//! Write converted messages to an mbox file.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::model::message::ConvertedMessage;

use super::eml::render;

/// Statistics returned by an mbox export.
#[derive(Debug)]
pub struct MboxStats {
    pub messages_written: u64,
    pub duplicates_skipped: u64,
    pub output_size: u64,
}

/// Write messages to `output` in mboxrd format.
///
/// Each message gets a `From ` separator line built from its sender and
/// date; body lines matching `>*From ` are escaped with one more `>`.
/// With `append`, messages are added after any existing content and a
/// message whose Message-ID is already in the file is skipped. Repeats
/// within `messages` are skipped in both modes. Messages without a
/// Message-ID are always written.
///
/// The progress callback receives `(current, total)`.
pub fn export_mbox(
    messages: &[ConvertedMessage],
    output: &Path,
    append: bool,
    progress: &dyn Fn(usize, usize),
) -> anyhow::Result<MboxStats> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut seen_ids = if append {
        existing_message_ids(output)?
    } else {
        HashSet::new()
    };
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(output)?;
    let mut out = BufWriter::new(file);
    let total = messages.len();
    let mut messages_written: u64 = 0;
    let mut duplicates_skipped: u64 = 0;

    for (i, message) in messages.iter().enumerate() {
        progress(i, total);
        if let Some(id) = message.message_id() {
            if !seen_ids.insert(id.to_string()) {
                duplicates_skipped += 1;
                continue;
            }
        }

        writeln!(out, "{}", separator_line(message))?;
        for line in render(message, "\n").lines() {
            if is_from_line(line) {
                out.write_all(b">")?;
            }
            writeln!(out, "{line}")?;
        }
        // Blank line between messages
        writeln!(out)?;
        messages_written += 1;
    }
    out.flush()?;
    progress(total, total);

    let output_size = std::fs::metadata(output)?.len();
    tracing::info!(
        path = %output.display(),
        count = messages_written,
        duplicates = duplicates_skipped,
        "Exported mbox"
    );

    Ok(MboxStats {
        messages_written,
        duplicates_skipped,
        output_size,
    })
}

/// Message-IDs of the messages already stored in an mbox file.
///
/// A missing file has none. Only header blocks are scanned: a header
/// block starts at an unescaped `From ` line and ends at the first blank
/// line.
fn existing_message_ids(path: &Path) -> std::io::Result<HashSet<String>> {
    let mut ids = HashSet::new();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(e) => return Err(e),
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut in_headers = false;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);

        if line.starts_with("From ") {
            in_headers = true;
        } else if in_headers {
            if line.is_empty() {
                in_headers = false;
            } else if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("message-id") && !value.trim().is_empty() {
                    ids.insert(value.trim().to_string());
                }
            }
        }
    }
    Ok(ids)
}

/// `From sender@host Fri Jan  1 00:00:00 2010`
fn separator_line(message: &ConvertedMessage) -> String {
    let sender = if message.from.address.is_empty() || message.from.address.contains(' ') {
        "MAILER-DAEMON"
    } else {
        message.from.address.as_str()
    };
    let date = message
        .sent_date
        .unwrap_or_default()
        .format("%a %b %e %H:%M:%S %Y");
    format!("From {sender} {date}")
}

/// Whether a line must be escaped (`From `, `>From `, `>>From `, …).
fn is_from_line(line: &str) -> bool {
    line.trim_start_matches('>').starts_with("From ")
}
