//! Device-side library for the authentication API: a typed HTTP client plus
//! the session manager that owns the token pair, mirrors it to secure
//! storage, and keeps at most one refresh in flight.

pub mod api;
pub mod error;
pub mod jwt;
pub mod session;
pub mod storage;

pub use api::{ApiClient, AuthPayload, TokenPair, UserProfile};
pub use error::ClientError;
pub use session::{AuthState, SessionManager};
pub use storage::{MemoryStore, SessionStore};
