//! Password authentication, signed session cookies and the session pipeline.

pub mod cookie;
pub mod credentials;
pub mod middleware;
pub mod password;
pub mod session;

pub use credentials::{authenticate, register, AuthError, INVALID_CREDENTIALS};
pub use middleware::{session_layer, AppState, CurrentUser, SessionHandle};
pub use session::{generate_session_id, SessionState};
