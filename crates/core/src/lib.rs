//! EOClient Core - Fundamental types and utilities

mod error;

pub use error::*;
