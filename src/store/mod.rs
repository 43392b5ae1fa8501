//! In-memory per-user state shared by the conversation and the background tasks.

pub mod records;

pub use records::Subscription;
pub use records::UserId;
pub use records::UserRecords;
