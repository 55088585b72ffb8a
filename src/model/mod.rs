//! Core data model types for rows, contacts, and converted messages.

pub mod address;
pub mod message;
pub mod person;
pub mod row;
