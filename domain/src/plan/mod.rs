//! Plan entities and parsing.

pub mod entities;
pub mod parser;
