//! Export converted messages: individual `.eml` files or an mbox.

pub mod eml;
pub mod mbox;
