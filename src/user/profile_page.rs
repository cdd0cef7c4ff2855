//! The profile page where users change their personal details and preferences.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    currency::Currency,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_CHECKBOX_STYLE, FORM_ERROR_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, text_input,
    },
    navigation::NavBar,
    user::{
        UserDetails, UserID, UserProfile, get_user_by_id, get_user_profile, update_user_details,
        update_user_profile,
    },
};

/// The state needed for the profile page and its endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;
    let profile = get_user_profile(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get profile of user {user_id}: {error}"))?;

    let member_since = user.created_at.date().to_string();

    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-6"
            {
                header
                {
                    h1 class="text-xl font-bold" { "Profile" }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Member since " (member_since)
                    }
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "Personal details" }
                    (details_form(&user.details, None))
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "Preferences" }
                    (preferences_form(&profile, None))
                }
            }
        }
    };

    Ok(base("Profile", &[], &content).into_response())
}

/// The fields of the personal details form.
///
/// Blank optional fields are parsed as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDetailsForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub passport_number: Option<String>,
    pub inn: Option<String>,
}

impl From<ProfileDetailsForm> for UserDetails {
    fn from(form: ProfileDetailsForm) -> Self {
        Self {
            username: form.username,
            email: form.email,
            first_name: form.first_name,
            last_name: form.last_name,
            phone_number: form.phone_number,
            address: form.address,
            passport_number: form.passport_number,
            inn: form.inn,
        }
    }
}

/// Handle the personal details form.
///
/// The form is always returned so that it can be swapped in place, either
/// with an inline error or together with a success alert.
pub async fn update_profile_details_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    // Must use axum_extra's Form since that parses an empty string as None
    Form(form): Form<ProfileDetailsForm>,
) -> Response {
    let raw_details = UserDetails::from(form);

    let details = match raw_details.clone().validated() {
        Ok(details) => details,
        Err(error) => {
            return details_form(&raw_details, Some(&format!("Error: {error}"))).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user_details(user_id, &details, &connection) {
        Ok(()) => html! {
            (details_form(&details, None))
            (Alert::SuccessSimple { message: "Profile updated".to_owned() }.into_html())
        }
        .into_response(),
        Err(error @ (Error::DuplicateUsername | Error::DuplicateEmail)) => {
            details_form(&details, Some(&format!("Error: {error}"))).into_response()
        }
        Err(error) => {
            tracing::error!("could not update the details of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// The fields of the preferences form.
///
/// Checkboxes are only sent when ticked, so `Some` means enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePreferencesForm {
    pub monthly_budget: f64,
    pub currency: Currency,
    pub notification_enabled: Option<String>,
    pub email_notifications: Option<String>,
    pub ai_recommendations_enabled: Option<String>,
}

/// Handle the preferences form.
pub async fn update_profile_preferences_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfilePreferencesForm>,
) -> Response {
    let profile = UserProfile {
        user_id,
        monthly_budget: form.monthly_budget,
        currency: form.currency,
        notification_enabled: form.notification_enabled.is_some(),
        email_notifications: form.email_notifications.is_some(),
        ai_recommendations_enabled: form.ai_recommendations_enabled.is_some(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_user_profile(&profile, &connection) {
        Ok(()) => html! {
            (preferences_form(&profile, None))
            (Alert::Success {
                message: "Preferences saved".to_owned(),
                details: format!("Amounts are now shown in {}.", profile.currency.label()),
            }.into_html())
        }
        .into_response(),
        Err(error @ Error::NegativeMonthlyBudget(_)) => {
            preferences_form(&profile, Some(&format!("Error: {error}"))).into_response()
        }
        Err(error) => {
            tracing::error!("could not update the preferences of user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn details_form(details: &UserDetails, error_message: Option<&str>) -> Markup {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();

    html! {
        form
            hx-put=(endpoints::PROFILE_DETAILS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            (text_input("username", "Username", "text", &details.username, true, None))
            (text_input("email", "Email", "email", &details.email, true, None))
            (text_input("first_name", "First name", "text", &details.first_name, true, None))
            (text_input("last_name", "Last name", "text", &details.last_name, true, None))
            (text_input("phone_number", "Phone number", "tel", &optional(&details.phone_number), false, None))
            (text_input("address", "Address", "text", &optional(&details.address), false, None))
            (text_input("passport_number", "Passport number", "text", &optional(&details.passport_number), false, None))
            (text_input("inn", "INN", "text", &optional(&details.inn), false, None))

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save details" }
        }
    }
}

fn preferences_form(profile: &UserProfile, error_message: Option<&str>) -> Markup {
    let checkbox = |name: &str, label: &str, checked: bool| {
        html! {
            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name=(name)
                    id=(name)
                    checked[checked]
                    class=(FORM_CHECKBOX_STYLE);

                label for=(name) class="block text-sm font-medium" { (label) }
            }
        }
    };

    html! {
        form
            hx-put=(endpoints::PROFILE_PREFERENCES_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="monthly_budget" class=(FORM_LABEL_STYLE) { "Monthly budget" }

                input
                    type="number"
                    name="monthly_budget"
                    id="monthly_budget"
                    min="0"
                    step="0.01"
                    value=(profile.monthly_budget)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                select name="currency" id="currency" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for currency in Currency::ALL {
                        option value=(currency.code()) selected[currency == profile.currency]
                        {
                            (currency.label())
                        }
                    }
                }
            }

            (checkbox("notification_enabled", "Notifications", profile.notification_enabled))
            (checkbox("email_notifications", "E-mail notifications", profile.email_notifications))
            (checkbox(
                "ai_recommendations_enabled",
                "Show spending recommendations on the dashboard",
                profile.ai_recommendations_enabled,
            ))

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save preferences" }
        }
    }
}
