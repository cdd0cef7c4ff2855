//! The new budget page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, Query};
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    budget::{
        budgets_page::BudgetMonthQuery,
        core::{create_budget, format_budget_month},
        form::{BudgetFormData, FormTarget, budget_form_view},
    },
    category::get_active_categories,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::TransactionType,
    user::{UserID, get_user_profile},
};

/// The state needed for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the new budget page, for the month in the query or the current month.
pub async fn get_new_budget_page(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<BudgetMonthQuery>,
) -> Result<Response, Error> {
    let month = query.month_or_current(get_local_date(&state.local_timezone)?);
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_active_categories(user_id, Some(TransactionType::Expense), &connection)?;
    let currency = get_user_profile(user_id, &connection)?.currency;
    let values = BudgetFormData {
        category_id: None,
        amount: None,
        month: format_budget_month(month),
    };

    let content = html! {
        (NavBar::new(endpoints::NEW_BUDGET_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "New Budget" }
            (budget_form_view(FormTarget::Create, &values, &categories, None))
        }
    };

    Ok(base("New Budget", &[currency_input_styles(currency)], &content).into_response())
}

/// Handle the new budget form, redirects to the budgets page for the budget's month.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<BudgetFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let render_error = |error: Error| {
        let categories =
            get_active_categories(user_id, Some(TransactionType::Expense), &connection)
                .inspect_err(|error| tracing::error!("could not get categories: {error}"))
                .unwrap_or_default();

        budget_form_view(
            FormTarget::Create,
            &form_data,
            &categories,
            Some(&format!("Error: {error}")),
        )
        .into_response()
    };

    let new_budget = match form_data.validated() {
        Ok(new_budget) => new_budget,
        Err(error) => return render_error(error),
    };

    match create_budget(user_id, &new_budget, &connection) {
        Ok(budget) => (
            HxRedirect(format!(
                "{}?month={}",
                endpoints::BUDGETS_VIEW,
                format_budget_month(budget.month)
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::DuplicateBudget
            | Error::InvalidCategory
            | Error::NonPositiveAmount(_)),
        ) => render_error(error),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a budget: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::{Form, Query};
    use time::macros::date;

    use crate::{
        budget::{
            budgets_page::BudgetMonthQuery, core::get_budgets_for_month, form::BudgetFormData,
        },
        category::{CategoryId, NewCategory, create_category},
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_user, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        transaction::TransactionType,
        user::UserID,
    };

    use super::{CreateBudgetState, create_budget_endpoint, get_new_budget_page};

    fn get_state() -> (CreateBudgetState, UserID, CategoryId) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();

        (
            CreateBudgetState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
            food.id,
        )
    }

    #[tokio::test]
    async fn render_page_for_requested_month() {
        let (state, user_id, _) = get_state();

        let response = get_new_budget_page(
            State(state),
            Extension(user_id),
            Query(BudgetMonthQuery {
                month: Some("2025-06".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        assert_form_input_with_value(&form, "month", "month", "2025-06");
        assert_form_submit_button_with_text(&form, "Create Budget");
    }

    #[tokio::test]
    async fn can_create_budget() {
        let (state, user_id, food) = get_state();
        let form = BudgetFormData {
            category_id: Some(food),
            amount: Some(8000.0),
            month: "2025-06".to_owned(),
        };

        let response = create_budget_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &format!("{}?month=2025-06", endpoints::BUDGETS_VIEW));
        let budgets = get_budgets_for_month(
            user_id,
            date!(2025 - 06 - 01),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].budget.amount, 8000.0);
    }

    #[tokio::test]
    async fn duplicate_budget_returns_form_error() {
        let (state, user_id, food) = get_state();
        let form = BudgetFormData {
            category_id: Some(food),
            amount: Some(8000.0),
            month: "2025-06".to_owned(),
        };
        create_budget_endpoint(State(state.clone()), Extension(user_id), Form(form.clone())).await;

        let response = create_budget_endpoint(State(state), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: a budget for that category and month already exists",
        );
    }

    #[tokio::test]
    async fn income_category_returns_form_error() {
        let (state, user_id, _) = get_state();
        let salary = create_category(
            user_id,
            &NewCategory::for_test("Salary", TransactionType::Income),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let form = BudgetFormData {
            category_id: Some(salary.id),
            amount: Some(100.0),
            month: "2025-06".to_owned(),
        };

        let response = create_budget_endpoint(State(state), Extension(user_id), Form(form))
            .await
            .into_response();

        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: the category does not refer to one of your active categories",
        );
    }
}
