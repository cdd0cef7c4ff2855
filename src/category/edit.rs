//! Category editing page and endpoint.

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
    category::{
        CategoryId,
        domain::CategoryFormData,
        form::{FormTarget, category_form_view},
        get_category, update_category,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit category page and endpoint.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(user_id, category_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
        }
    })?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::CATEGORY, category_id);
    let form = category_form_view(
        FormTarget::Update(&update_endpoint),
        &CategoryFormData::from(&category),
        None,
    );

    let content = html! {
        (NavBar::new(&edit_endpoint).into_html())
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    Ok(base("Edit Category", &[], &content).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::CATEGORY, category_id);

    let category = match form_data.validated() {
        Ok(category) => category,
        Err(error) => {
            return category_form_view(
                FormTarget::Update(&update_endpoint),
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

    match update_category(user_id, category_id, &category, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::DuplicateCategoryName) => category_form_view(
            FormTarget::Update(&update_endpoint),
            &form_data,
            Some(&format!("Error: {error}")),
        )
        .into_response(),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_category_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;

    use crate::{
        category::{
            Category, CategoryIcon, NewCategory, create_category, domain::CategoryFormData,
            edit::EditCategoryState, get_category, get_edit_category_page,
            update_category_endpoint,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, create_test_user, create_test_user_named, get_test_connection,
            must_get_form, parse_html_document, parse_html_fragment,
        },
        transaction::TransactionType,
        user::UserID,
    };

    fn get_state() -> (EditCategoryState, UserID, Category) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();

        (
            EditCategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
            category,
        )
    }

    #[tokio::test]
    async fn get_edit_category_page_succeeds() {
        let (state, user_id, category) = get_state();

        let response = get_edit_category_page(Path(category.id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::CATEGORY, category.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Food");
        assert_form_submit_button_with_text(&form, "Update Category");
    }

    #[tokio::test]
    async fn other_users_category_is_not_found() {
        let (state, _, category) = get_state();
        let other = create_test_user_named("other", &state.db_connection.lock().unwrap());

        let response =
            get_edit_category_page(Path(category.id), State(state), Extension(other.id)).await;

        assert_eq!(response.unwrap_err(), crate::Error::NotFound);
    }

    #[tokio::test]
    async fn update_can_deactivate_category() {
        let (state, user_id, category) = get_state();
        let form = CategoryFormData {
            name: "Eating out".to_owned(),
            type_: TransactionType::Expense,
            icon: CategoryIcon::Food,
            color: "#ff0000".to_owned(),
            description: None,
            is_active: None,
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state.clone()),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let got = get_category(user_id, category.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.name.as_ref(), "Eating out");
        assert_eq!(got.icon, CategoryIcon::Food);
        assert!(!got.is_active);
    }

    #[tokio::test]
    async fn update_with_invalid_color_returns_form_error() {
        let (state, user_id, category) = get_state();
        let form = CategoryFormData {
            name: "Food".to_owned(),
            color: "red".to_owned(),
            ..Default::default()
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: \"red\" is not a colour of the form #rrggbb",
        );
    }

    #[tokio::test]
    async fn update_missing_category_returns_not_found() {
        let (state, user_id, _) = get_state();

        let response = update_category_endpoint(
            Path(999),
            State(state),
            Extension(user_id),
            Form(CategoryFormData {
                name: "Food".to_owned(),
                ..Default::default()
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
