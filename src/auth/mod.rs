//! Authentication: issuing credentials at log-in and verifying them on every
//! protected request.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod session;
mod token;

pub use cookie::{COOKIE_TOKEN, invalidate_auth_cookie};
pub use log_in::{LogInResponse, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, AuthenticatedUser, auth_guard};
pub use register::post_register;
pub use session::{Session, get_session};
pub use token::{IssuedToken, TokenKeys, issue_token, verify_token};
