pub mod chat;
pub mod core;
pub mod scraping;
pub mod server;
pub mod tools;

// --- Primary core exports ---
pub use crate::core::types;
pub use crate::core::types::*;
pub use crate::core::AppState;

pub use crate::tools::{consolidate, extract, render, response_parser};
