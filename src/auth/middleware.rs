//! Middleware that only lets requests with a valid auth cookie through.
//!
//! Handlers behind the middleware receive the logged in user with
//! `Extension(user_id): Extension<UserID>`.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url,
    },
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far each authenticated request pushes the cookie expiry forward.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Check the auth cookie, run the request with the user's ID and then
/// slide the cookie expiry forward on the response.
///
/// Requests without a valid cookie get `redirect_to_log_in` applied to the
/// log-in URL instead.
async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect_to_log_in: fn(String) -> Response,
) -> Response {
    let log_in_url = build_log_in_redirect_url(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "invalid timezone {}, treating request as logged out",
            state.local_timezone
        );
        return redirect_to_log_in(log_in_url);
    };

    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("could not read cookie jar: {error:?}");
            return redirect_to_log_in(log_in_url);
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(_) => return redirect_to_log_in(log_in_url),
    };

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        state.cookie_duration,
        local_offset,
    ) {
        Ok(extended_jar) => extended_jar,
        Err(error) => {
            tracing::error!("could not extend auth cookie for user {}: {error}", token.user_id);
            jar
        }
    };

    // The handler may have set its own cookies (e.g. log out), so only append.
    let (mut parts, body) = response.into_parts();
    let jar_response = jar.into_response();
    for value in jar_response.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Auth guard for pages, redirects with a 303 to the log-in page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, |log_in_url| {
        Redirect::to(&log_in_url).into_response()
    })
    .await
}

/// Auth guard for HTMX endpoints, redirects with the `HX-Redirect` header
/// since HTMX does not follow redirects for swaps.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, |log_in_url| {
        (HxRedirect(log_in_url), StatusCode::OK).into_response()
    })
    .await
}
