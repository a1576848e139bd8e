pub mod refresh_tokens;
pub mod users;
