//! Row → message conversion.
//!
//! - [`identity`]: Message-ID and References derivation
//! - [`record`]: one row to one [`ConvertedMessage`](crate::model::message::ConvertedMessage)
//! - [`batch`]: a stream of rows to a [`ConversionResult`](crate::model::message::ConversionResult)

pub mod batch;
pub mod identity;
pub mod record;
