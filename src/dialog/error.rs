use crate::store::UserId;

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("User {user} has no selected record book.")]
    SessionExpired { user: UserId },
}
