//! Core domain types: errors, questions, intent.

pub mod error;
pub mod intent;
pub mod question;
