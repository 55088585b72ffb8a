//! `smsmime`: turn SMS/MMS message-store rows into MIME email messages.
//!
//! This crate provides the conversion core used for backing up a phone's
//! message store to a mailbox: contact resolution with a bounded cache,
//! deterministic Message-ID derivation, row normalization, and batch
//! conversion with a resumable date watermark. Rendering to `.eml` and
//! mbox files is provided on top.

pub mod config;
pub mod contacts;
pub mod convert;
pub mod error;
pub mod export;
pub mod mime;
pub mod model;
