pub mod session;
pub mod user;

pub use session::{ChatMessage, Role, Session, SessionStatus, DEFAULT_GREETING, LOGIN_GRANT};
pub use user::UserRecord;
