//! MIME header encoding helpers.

pub mod encode;
