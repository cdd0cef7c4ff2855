//! The new transaction page and the endpoint for creating transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form and Query since they parse an empty string as
// None instead of rejecting the request.
use axum_extra::extract::{Form, Query};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    card::{CardId, get_cards},
    category::get_active_categories,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{
        core::{NewTransaction, TransactionType, create_transaction},
        form::{FormTarget, TransactionFormData, TransactionFormValues, transaction_form_view},
    },
    user::{UserID, get_user_profile},
};

/// The state needed to show the new transaction page or create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters accepted by the new transaction page.
#[derive(Debug, Default, Deserialize)]
pub struct NewTransactionQuery {
    /// The card to preselect, e.g. when coming from the cards page.
    #[serde(default)]
    pub card: Option<CardId>,
}

/// Render the new transaction page.
pub async fn get_new_transaction_page(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NewTransactionQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_active_categories(user_id, None, &connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let cards = get_cards(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get cards: {error}"))?
        .into_iter()
        .filter(|card| card.is_active)
        .collect::<Vec<_>>();
    let currency = get_user_profile(user_id, &connection)?.currency;

    let card_id = query
        .card
        .filter(|card_id| cards.iter().any(|card| card.id == *card_id));
    let values = TransactionFormValues {
        type_: TransactionType::Expense,
        amount: None,
        date: today,
        description: "",
        category_id: None,
        card_id,
        max_date: today,
    };

    let content = html! {
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "New Transaction" }
            (transaction_form_view(FormTarget::Create, &values, &categories, &cards))
        }
    };

    Ok(base(
        "New Transaction",
        &[currency_input_styles(currency)],
        &content,
    )
    .into_response())
}

/// A route handler for creating a new transaction, redirects to the
/// transactions page on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let new_transaction = match NewTransaction::from(form).validated(today) {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::debug!("rejected transaction: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_transaction(user_id, &new_transaction, &connection) {
        tracing::error!("could not create transaction: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
