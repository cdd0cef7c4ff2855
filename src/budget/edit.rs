//! The edit budget page and endpoint.

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
    budget::{
        core::{BudgetId, format_budget_month, get_budget, update_budget},
        form::{BudgetFormData, FormTarget, budget_form_view},
    },
    category::{Category, get_active_categories, get_category},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    transaction::TransactionType,
    user::{UserID, get_user_profile},
};

/// The state needed for editing a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The active expense categories plus the budget's current category, which
/// may have been deactivated.
fn category_choices(
    user_id: UserID,
    current: Option<&Category>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let mut categories =
        get_active_categories(user_id, Some(TransactionType::Expense), connection)?;

    if let Some(current) = current.filter(|current| !current.is_active) {
        categories.push(current.clone());
    }

    Ok(categories)
}

/// Render the edit budget page.
pub async fn get_edit_budget_page(
    Path(budget_id): Path<BudgetId>,
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(user_id, budget_id, &connection)?;
    let current_category = get_category(user_id, budget.category_id, &connection)?;
    let categories = category_choices(user_id, Some(&current_category), &connection)?;
    let currency = get_user_profile(user_id, &connection)?.currency;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::BUDGET, budget_id);

    let content = html! {
        (NavBar::new(&edit_endpoint).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Edit Budget" }
            (budget_form_view(
                FormTarget::Update(&update_endpoint),
                &BudgetFormData::from(&budget),
                &categories,
                None,
            ))
        }
    };

    Ok(base("Edit Budget", &[currency_input_styles(currency)], &content).into_response())
}

/// Handle the edit budget form, redirects to the budgets page for the budget's month.
pub async fn update_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<EditBudgetState>,
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

    let update_endpoint = endpoints::format_endpoint(endpoints::BUDGET, budget_id);
    let render_error = |error: Error| {
        let current_category = get_budget(user_id, budget_id, &connection)
            .and_then(|budget| get_category(user_id, budget.category_id, &connection))
            .ok();
        let categories = category_choices(user_id, current_category.as_ref(), &connection)
            .inspect_err(|error| tracing::error!("could not get categories: {error}"))
            .unwrap_or_default();

        budget_form_view(
            FormTarget::Update(&update_endpoint),
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

    match update_budget(user_id, budget_id, &new_budget, &connection) {
        Ok(()) => (
            HxRedirect(format!(
                "{}?month={}",
                endpoints::BUDGETS_VIEW,
                format_budget_month(new_budget.month)
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingBudget) => Error::UpdateMissingBudget.into_alert_response(),
        Err(
            error @ (Error::DuplicateBudget
            | Error::InvalidCategory
            | Error::NonPositiveAmount(_)),
        ) => render_error(error),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
