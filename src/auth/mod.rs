//! Registration, log in and log out, plus the cookie based session that
//! protects every other page.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;
mod token;

pub(crate) use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use redirect::{log_in_url_with_redirect, normalize_redirect_url};
pub use register::{get_register_page, register_user};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
