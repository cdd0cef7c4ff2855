//! The add card page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    card::{
        create_card,
        form::{CardFormData, FormTarget, card_form_view},
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserID,
};

/// The state needed for adding a card.
#[derive(Debug, Clone)]
pub struct CreateCardEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCardEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the add card page.
pub async fn get_new_card_page() -> Response {
    let form = card_form_view(FormTarget::Create, &CardFormData::default(), None);

    let content = html! {
        (NavBar::new(endpoints::NEW_CARD_VIEW).into_html())
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Add Card", &[], &content).into_response()
}

/// Handle the add card form.
pub async fn create_card_endpoint(
    State(state): State<CreateCardEndpointState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CardFormData>,
) -> Response {
    let new_card = match form_data.validated(None) {
        Ok(card) => card,
        Err(error) => {
            return card_form_view(
                FormTarget::Create,
                &form_data,
                Some(&format!("Error: {error}")),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_card(user_id, &new_card, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CARDS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a card: {error}");

            error.into_alert_response()
        }
    }
}
