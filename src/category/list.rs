//! Categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, count_transactions_per_category, get_categories},
    endpoints,
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, category_badge, edit_delete_action_links,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with the URLs and counts the list needs.
struct CategoryRow {
    category: Category,
    edit_url: String,
    delete_url: String,
    confirm_message: String,
    transaction_count: u32,
}

/// Render the categories listing page with transaction counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let transactions_per_category = count_transactions_per_category(user_id, &connection)
        .inspect_err(|error| {
            tracing::error!("Could not count transactions per category: {error}")
        })?;

    let rows = categories
        .into_iter()
        .map(|category| {
            let transaction_count = transactions_per_category
                .get(&category.id)
                .copied()
                .unwrap_or(0);

            CategoryRow {
                edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
                delete_url: endpoints::format_endpoint(endpoints::CATEGORY, category.id),
                confirm_message: format!(
                    "Are you sure you want to delete '{}'? {} transaction(s) will become \
                    uncategorised and its budgets will be deleted.",
                    category.name, transaction_count
                ),
                category,
                transaction_count,
            }
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn status_text(is_active: bool) -> &'static str {
    if is_active { "Active" } else { "Inactive" }
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        let category = &row.category;

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(category.icon.emoji(), category.name.as_ref(), category.color.as_ref()))
                }
                td class=(TABLE_CELL_STYLE) { (category.type_.label()) }
                td class=(TABLE_CELL_STYLE) { (status_text(category.is_active)) }
                td class=(TABLE_CELL_STYLE) { (category.description) }
                td class=(TABLE_CELL_STYLE) { (row.transaction_count) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &row.confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let empty_message = html! {
        "No categories created yet. "
        a href=(new_category_route) class=(LINK_STYLE) { "Create your first category" }
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE) { "Create Category" }
                }

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class=(CARD_STYLE) data-category-card="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                (category_badge(
                                    row.category.icon.emoji(),
                                    row.category.name.as_ref(),
                                    row.category.color.as_ref(),
                                ))
                                span class="text-sm text-gray-500 dark:text-gray-400"
                                {
                                    (row.category.type_.label()) " · " (status_text(row.category.is_active))
                                }
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (edit_delete_action_links(
                                    &row.edit_url,
                                    &row.delete_url,
                                    &row.confirm_message,
                                    "closest [data-category-card='true']",
                                    "outerHTML",
                                ))
                            }
                        }
                    }

                    @if rows.is_empty() {
                        li class="rounded border border-dashed border-gray-300 px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400"
                        {
                            (empty_message)
                        }
                    }
                }

                section class="hidden lg:block dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        (empty_message)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}
