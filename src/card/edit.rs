//! The edit card page and endpoint, also used to correct a card's balance.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
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
        CardId,
        form::{CardFormData, FormTarget, card_form_view},
        get_card, update_card,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit card page and endpoint.
#[derive(Debug, Clone)]
pub struct EditCardState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the edit card page.
pub async fn get_edit_card_page(
    Path(card_id): Path<CardId>,
    State(state): State<EditCardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let card = get_card(user_id, card_id, &connection)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CARD_VIEW, card_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::CARD, card_id);
    let form = card_form_view(
        FormTarget::Update(&update_endpoint, &card.last_four),
        &CardFormData::from(&card),
        None,
    );

    let content = html! {
        (NavBar::new(&edit_endpoint).into_html())
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { (card.masked_number()) }
            (form)
        }
    };

    Ok(base("Edit Card", &[], &content).into_response())
}

/// Handle the edit card form.
///
/// The balance entered replaces the stored balance.
pub async fn update_card_endpoint(
    Path(card_id): Path<CardId>,
    State(state): State<EditCardState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CardFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let current = match get_card(user_id, card_id, &connection) {
        Ok(card) => card,
        Err(Error::NotFound) => return Error::UpdateMissingCard.into_alert_response(),
        Err(error) => {
            tracing::error!("could not get card {card_id}: {error}");
            return error.into_alert_response();
        }
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::CARD, card_id);

    let card = match form_data.validated(Some(&current.last_four)) {
        Ok(card) => card,
        Err(error) => {
            return card_form_view(
                FormTarget::Update(&update_endpoint, &current.last_four),
                &form_data,
                Some(&format!("Error: {error}")),
            )
            .into_response();
        }
    };

    match update_card(user_id, card_id, &card, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CARDS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating card {card_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_card_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;

    use crate::{
        Error,
        card::{
            Card, CardSystem, NewCard, create_card, edit::EditCardState, form::CardFormData,
            get_card, get_edit_card_page, update_card_endpoint,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, create_test_user, create_test_user_named,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment,
        },
        user::UserID,
    };

    fn get_state() -> (EditCardState, UserID, Card) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = create_card(user.id, &NewCard::for_test(), &connection).unwrap();

        (
            EditCardState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
            card,
        )
    }

    #[tokio::test]
    async fn render_page() {
        let (state, user_id, card) = get_state();

        let response = get_edit_card_page(Path(card.id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::CARD, card.id),
            "hx-put",
        );
        assert_form_submit_button_with_text(&form, "Update Card");
    }

    #[tokio::test]
    async fn other_users_card_is_not_found() {
        let (state, _, card) = get_state();
        let other = create_test_user_named("other", &state.db_connection.lock().unwrap());

        let result = get_edit_card_page(Path(card.id), State(state), Extension(other.id)).await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }

    #[tokio::test]
    async fn update_corrects_balance_and_keeps_number() {
        let (state, user_id, card) = get_state();
        let form = CardFormData {
            card_holder: "IVAN PETROV".to_owned(),
            card_number: None,
            card_system: CardSystem::Mastercard,
            balance: Some(-300.25),
            is_active: None,
            ..Default::default()
        };

        let response = update_card_endpoint(
            Path(card.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CARDS_VIEW);
        let got = get_card(user_id, card.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.balance, -300.25);
        assert_eq!(got.last_four, card.last_four);
        assert_eq!(got.card_system, CardSystem::Mastercard);
        assert!(!got.is_active);
    }

    #[tokio::test]
    async fn update_with_empty_holder_returns_form_error() {
        let (state, user_id, card) = get_state();
        let form = CardFormData {
            card_holder: "".to_owned(),
            ..Default::default()
        };

        let response =
            update_card_endpoint(Path(card.id), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Card holder cannot be empty");
    }

    #[tokio::test]
    async fn update_missing_card_returns_not_found() {
        let (state, user_id, _) = get_state();

        let response = update_card_endpoint(
            Path(999),
            State(state),
            Extension(user_id),
            Form(CardFormData::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
