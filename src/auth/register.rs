//! The registration page and the endpoint that creates a user account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::set_auth_cookie,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input, text_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
    user::{UserDetails, create_user},
};

/// The minimum number of characters the password should have to be
/// accepted by the browser. zxcvbn still checks the password on the server.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 10;

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

impl From<&RegisterForm> for UserDetails {
    fn from(form: &RegisterForm) -> Self {
        UserDetails {
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone_number: form.phone_number.clone(),
            ..Default::default()
        }
    }
}

/// The form field an error message is shown under.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

struct FieldError<'a> {
    field: Field,
    message: &'a str,
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(form: &RegisterForm, error: Option<FieldError>) -> Markup {
    let error_for = |field: Field| {
        error
            .as_ref()
            .filter(|error| error.field == field)
            .map(|error| error.message)
    };

    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", &form.username, true, error_for(Field::Username)))
            (text_input("email", "Email", "email", &form.email, true, error_for(Field::Email)))

            div class="grid grid-cols-2 gap-4"
            {
                (text_input("first_name", "First name", "text", &form.first_name, false, None))
                (text_input("last_name", "Last name", "text", &form.last_name, false, None))
            }

            (text_input(
                "phone_number",
                "Phone number (optional)",
                "tel",
                form.phone_number.as_deref().unwrap_or_default(),
                false,
                None,
            ))
            (password_input(&form.password, PASSWORD_INPUT_MIN_LENGTH, error_for(Field::Password)))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, error_for(Field::ConfirmPassword)))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                    "Log in here"
                }
            }
        }
    }
}

fn form_with_error(form: &RegisterForm, field: Field, message: &str) -> Response {
    registration_form(form, Some(FieldError { field, message })).into_response()
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form(&RegisterForm::default(), None);
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// Create the user and their default profile, log them in and send them to the dashboard.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let details = match UserDetails::from(&form).validated() {
        Ok(details) => details,
        Err(error @ Error::EmptyUsername) => {
            return form_with_error(&form, Field::Username, &error.to_string());
        }
        Err(error) => return form_with_error(&form, Field::Email, &error.to_string()),
    };

    let user_inputs = [
        details.username.as_str(),
        details.email.as_str(),
        details.first_name.as_str(),
        details.last_name.as_str(),
    ];
    let validated_password = match ValidatedPassword::new(&form.password, &user_inputs) {
        Ok(password) => password,
        Err(error) => return form_with_error(&form, Field::Password, &error.to_string()),
    };

    if form.password != form.confirm_password {
        return form_with_error(&form, Field::ConfirmPassword, "Passwords do not match");
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        match create_user(details, password_hash, &connection) {
            Ok(user) => user,
            Err(error @ Error::DuplicateUsername) => {
                return form_with_error(&form, Field::Username, &error.to_string());
            }
            Err(error @ Error::DuplicateEmail) => {
                return form_with_error(&form, Field::Email, &error.to_string());
            }
            Err(error) => {
                tracing::error!("An unhandled error occurred while inserting a new user: {error}");
                return get_internal_server_error_redirect();
            }
        }
    };

    tracing::info!("registered user {} ({})", user.id, user.details.username);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use scraper::{Html, Selector};
    use sha2::{Digest, Sha512};

    use crate::{
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        endpoints,
        test_utils::get_test_connection,
        user::{count_users, get_user_by_login, get_user_profile},
    };
    use axum_extra::extract::cookie::Key;

    use super::{RegisterForm, RegistrationState, register_user};

    const STRONG_PASSWORD: &str = "tramway-Sunflower-ocean-1984!";

    fn get_state() -> RegistrationState {
        RegistrationState {
            cookie_key: Key::from(&Sha512::digest("kopilka-test")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "ivan".to_owned(),
            email: "ivan@example.com".to_owned(),
            first_name: "Ivan".to_owned(),
            last_name: "Petrov".to_owned(),
            phone_number: Some(String::new()),
            password: STRONG_PASSWORD.to_owned(),
            confirm_password: STRONG_PASSWORD.to_owned(),
        }
    }

    #[track_caller]
    fn assert_single_error_containing(text: &str, want: &str) {
        let fragment = Html::parse_fragment(text);
        let selector = Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&selector).collect::<Vec<_>>();

        assert_eq!(paragraphs.len(), 1, "want 1 error, got {}", paragraphs.len());
        let got = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(got.contains(want), "'{got}' does not contain '{want}'");
    }

    #[tokio::test]
    async fn register_creates_user_and_logs_in() {
        let state = get_state();
        let server = get_test_server(state.clone());

        let response = server.post(endpoints::USERS).form(&valid_form()).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        let _ = response.cookie(COOKIE_TOKEN);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_login("ivan", &connection).expect("user was not created");
        assert_eq!(user.details.phone_number, None);
        let profile = get_user_profile(user.id, &connection).unwrap();
        assert_eq!(profile.monthly_budget, 0.0);
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let state = get_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                password: "ivan123".to_owned(),
                confirm_password: "ivan123".to_owned(),
                ..valid_form()
            })
            .await;

        response.assert_status_ok();
        assert_single_error_containing(&response.text(), "password is too weak");
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let server = get_test_server(get_state());

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                confirm_password: "a-different-but-long-password".to_owned(),
                ..valid_form()
            })
            .await;

        response.assert_status_ok();
        assert_single_error_containing(&response.text(), "passwords do not match");
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let server = get_test_server(get_state());

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                email: "not-an-email".to_owned(),
                ..valid_form()
            })
            .await;

        response.assert_status_ok();
        assert_single_error_containing(&response.text(), "not a valid email address");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let server = get_test_server(get_state());
        server
            .post(endpoints::USERS)
            .form(&valid_form())
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                email: "another@example.com".to_owned(),
                ..valid_form()
            })
            .await;

        response.assert_status_ok();
        assert_single_error_containing(&response.text(), "username is already taken");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let server = get_test_server(get_state());
        server
            .post(endpoints::USERS)
            .form(&valid_form())
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                username: "ivan2".to_owned(),
                email: "IVAN@example.com".to_owned(),
                ..valid_form()
            })
            .await;

        response.assert_status_ok();
        assert_single_error_containing(&response.text(), "email address is already registered");
    }
}
