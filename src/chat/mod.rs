pub mod messages;
pub mod session;
pub mod state_machine;

pub use session::{ChatReply, ChatSession, SessionHandle, SessionStore};
pub use state_machine::{transition, Action, Command, ConversationStep, Transition};
