//! Budget deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    budget::core::{BudgetId, delete_budget},
    user::UserID,
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle budget deletion.
pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(user_id, budget_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Budget deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingBudget) => Error::DeleteMissingBudget.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting budget {budget_id}: {error}");
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
    use time::macros::date;

    use crate::{
        Error,
        budget::{NewBudget, create_budget, get_budget},
        category::{NewCategory, create_category},
        test_utils::{create_test_user, get_test_connection},
        transaction::TransactionType,
    };

    use super::{DeleteBudgetState, delete_budget_endpoint};

    #[tokio::test]
    async fn delete_budget_endpoint_succeeds() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        let budget = create_budget(
            user.id,
            &NewBudget {
                category_id: food.id,
                amount: 1000.0,
                month: date!(2025 - 03 - 01),
            },
            &connection,
        )
        .unwrap();
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_budget_endpoint(Path(budget.id), State(state.clone()), Extension(user.id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_budget(user.id, budget.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );

        let response = delete_budget_endpoint(Path(budget.id), State(state), Extension(user.id))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
