pub mod message;
pub mod user;

pub use message::{Message, MessageType};
pub use user::{User, UserRole, UserSummary};
