pub mod session_guard;

pub use session_guard::{session_guard, AuthUser, DASHBOARD_PATH, LOGIN_PATH};
