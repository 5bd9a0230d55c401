pub mod consolidate;
pub mod extract;
pub mod extraction_client;
pub mod prompt;
pub mod render;
pub mod response_parser;

pub use extraction_client::{Conversation, ExtractionService, OpenAiCompatClient};
