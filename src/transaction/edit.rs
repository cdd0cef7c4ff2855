//! The edit transaction page and the endpoint for updating transactions.
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
    card::get_cards,
    category::{get_active_categories, get_category},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{
        core::{NewTransaction, TransactionId, get_transaction, update_transaction},
        form::{FormTarget, TransactionFormData, TransactionFormValues, transaction_form_view},
    },
    user::{UserID, get_user_profile},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the edit transaction page.
///
/// The transaction's current category and card are offered even if they have
/// been deactivated since.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(user_id, transaction_id, &connection)?;

    let mut categories = get_active_categories(user_id, None, &connection)?;
    let inactive_category_id = transaction
        .category_id
        .filter(|category_id| !categories.iter().any(|category| category.id == *category_id));
    if let Some(category_id) = inactive_category_id {
        categories.push(get_category(user_id, category_id, &connection)?);
    }

    let cards = get_cards(user_id, &connection)?
        .into_iter()
        .filter(|card| card.is_active || Some(card.id) == transaction.card_id)
        .collect::<Vec<_>>();
    let currency = get_user_profile(user_id, &connection)?.currency;

    let edit_endpoint =
        endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::TRANSACTION, transaction_id);
    let values = TransactionFormValues::from_transaction(&transaction, today);

    let content = html! {
        (NavBar::new(&edit_endpoint).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Edit Transaction" }
            (transaction_form_view(
                FormTarget::Update(&update_endpoint),
                &values,
                &categories,
                &cards,
            ))
        }
    };

    Ok(base(
        "Edit Transaction",
        &[currency_input_styles(currency)],
        &content,
    )
    .into_response())
}

/// A route handler for updating a transaction, redirects to the transactions
/// page on success.
///
/// Card balances are corrected for any change of amount, type or card.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
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
            tracing::debug!("rejected update to transaction {transaction_id}: {error}");
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

    match update_transaction(user_id, transaction_id, &new_transaction, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingTransaction) => {
            Error::UpdateMissingTransaction.into_alert_response()
        }
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        Error,
        card::{NewCard, create_card, get_card},
        category::{NewCategory, create_category, set_category_active},
        endpoints,
        test_utils::{
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_user, create_test_user_named, get_test_connection,
            must_get_form, parse_html_document,
        },
        transaction::{
            NewTransaction, Transaction, TransactionType, create_transaction,
            form::TransactionFormData, get_transaction,
        },
        user::UserID,
    };

    use super::{EditTransactionState, get_edit_transaction_page, update_transaction_endpoint};

    fn get_state() -> (EditTransactionState, UserID, Transaction) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let transaction = create_transaction(
            user.id,
            &NewTransaction {
                type_: TransactionType::Expense,
                amount: 100.0,
                category_id: None,
                card_id: None,
                date: OffsetDateTime::now_utc().date(),
                description: "Lunch".to_owned(),
            },
            &connection,
        )
        .unwrap();

        (
            EditTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
            transaction,
        )
    }

    #[tokio::test]
    async fn render_page() {
        let (state, user_id, transaction) = get_state();

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user_id))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_submit_button_with_text(&form, "Update Transaction");
    }

    #[tokio::test]
    async fn page_offers_deactivated_current_category() {
        let (state, user_id, transaction) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let category = create_category(
                user_id,
                &NewCategory::for_test("Eating out", TransactionType::Expense),
                &connection,
            )
            .unwrap();
            connection
                .execute(
                    "UPDATE \"transaction\" SET category_id = ?1 WHERE id = ?2",
                    (category.id, transaction.id),
                )
                .unwrap();
            set_category_active(user_id, category.id, false, &connection).unwrap();
        }

        let response =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(user_id))
                .await
                .unwrap();

        let html = parse_html_document(response).await;
        let selected = html
            .select(&Selector::parse("select[name=category_id] option[selected]").unwrap())
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(selected.len(), 1);
        assert!(selected[0].contains("Eating out"));
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let (state, _, transaction) = get_state();
        let other = create_test_user_named("other", &state.db_connection.lock().unwrap());

        let result =
            get_edit_transaction_page(Path(transaction.id), State(state), Extension(other.id))
                .await;

        assert_eq!(result.unwrap_err(), Error::NotFound);
    }

    #[tokio::test]
    async fn moving_to_card_updates_balance() {
        let (state, user_id, transaction) = get_state();
        let card = create_card(
            user_id,
            &NewCard {
                balance: 500.0,
                ..NewCard::for_test()
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let form = TransactionFormData {
            type_: TransactionType::Expense,
            amount: 120.0,
            date: transaction.date,
            description: Some("Lunch".to_owned()),
            category_id: None,
            card_id: Some(card.id),
        };

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_transaction(user_id, transaction.id, &connection).unwrap();
        assert_eq!(updated.amount, 120.0);
        assert_eq!(updated.card_id, Some(card.id));
        assert_eq!(get_card(user_id, card.id, &connection).unwrap().balance, 380.0);
    }

    #[tokio::test]
    async fn update_missing_transaction_returns_not_found() {
        let (state, user_id, transaction) = get_state();
        let form = TransactionFormData {
            type_: TransactionType::Expense,
            amount: 1.0,
            date: transaction.date,
            description: None,
            category_id: None,
            card_id: None,
        };

        let response =
            update_transaction_endpoint(Path(999), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
