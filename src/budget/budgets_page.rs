//! The page listing a month's budgets and how much of each has been spent.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    budget::core::{
        BudgetUsage, format_budget_month, get_budgets_for_month, month_start, next_month,
        parse_budget_month, previous_month,
    },
    category::{Category, CategoryId, get_categories},
    currency::{Currency, format_currency},
    endpoints,
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, category_badge,
        edit_delete_action_links,
    },
    navigation::NavBar,
    timezone::get_local_date,
    user::{UserID, get_user_profile},
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the budgets and new budget pages.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetMonthQuery {
    /// The month to show, "YYYY-MM". Defaults to the current month.
    #[serde(default)]
    pub month: Option<String>,
}

impl BudgetMonthQuery {
    /// The first day of the requested month, or of the month of `today` if
    /// no valid month was requested.
    pub(super) fn month_or_current(&self, today: Date) -> Date {
        match self.month.as_deref().map(parse_budget_month) {
            Some(Ok(month)) => month,
            Some(Err(error)) => {
                tracing::debug!("ignoring budget month: {error}");
                month_start(today)
            }
            None => month_start(today),
        }
    }
}

/// Render the budgets of one month.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<BudgetMonthQuery>,
) -> Result<Response, Error> {
    let month = query.month_or_current(get_local_date(&state.local_timezone)?);
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_budgets_for_month(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets for {month}: {error}"))?;
    let categories: HashMap<CategoryId, Category> = get_categories(user_id, &connection)?
        .into_iter()
        .map(|category| (category.id, category))
        .collect();
    let currency = get_user_profile(user_id, &connection)?.currency;

    Ok(budgets_view(month, &budgets, &categories, currency).into_response())
}

fn month_url(month: Date) -> String {
    format!("{}?month={}", endpoints::BUDGETS_VIEW, format_budget_month(month))
}

fn progress_bar(usage: &BudgetUsage) -> Markup {
    let percent = usage.percent_used();
    let bar_color = if percent > 100.0 {
        "bg-red-600"
    } else if percent >= 80.0 {
        "bg-yellow-400"
    } else {
        "bg-green-600"
    };

    html! {
        div class="h-2 w-full rounded bg-gray-200 dark:bg-gray-700"
        {
            div class={ "h-2 rounded " (bar_color) } style={ "width: " (percent.min(100.0).round()) "%;" } {}
        }
    }
}

fn budget_tile(usage: &BudgetUsage, category: Option<&Category>, currency: Currency) -> Markup {
    let budget = &usage.budget;
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
    let delete_url = endpoints::format_endpoint(endpoints::BUDGET, budget.id);
    let remaining = usage.remaining();
    let remaining_class = if remaining < 0.0 {
        "tabular-nums text-red-700 dark:text-red-300"
    } else {
        "tabular-nums"
    };

    html! {
        li class=(CARD_STYLE) data-budget="true"
        {
            div class="flex items-start justify-between gap-3"
            {
                @if let Some(category) = category {
                    (category_badge(category.icon.emoji(), category.name.as_ref(), category.color.as_ref()))
                }

                span class="text-sm tabular-nums" data-percent-used="true"
                {
                    (format!("{:.0}%", usage.percent_used()))
                }
            }

            div class="mt-3" { (progress_bar(usage)) }

            dl class="mt-3 grid grid-cols-3 gap-2 text-sm"
            {
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Budget" }
                    dd class="tabular-nums" { (format_currency(budget.amount, currency)) }
                }
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Spent" }
                    dd class="tabular-nums" data-spent="true" { (format_currency(usage.spent, currency)) }
                }
                div
                {
                    dt class="text-gray-500 dark:text-gray-400" { "Remaining" }
                    dd class=(remaining_class) data-remaining="true"
                    {
                        (format_currency(remaining, currency))
                    }
                }
            }

            div class="mt-3 flex items-center gap-4 text-sm"
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    "Are you sure you want to delete this budget?",
                    "closest [data-budget='true']",
                    "outerHTML",
                ))
            }
        }
    }
}

fn budgets_view(
    month: Date,
    budgets: &[BudgetUsage],
    categories: &HashMap<CategoryId, Category>,
    currency: Currency,
) -> Markup {
    let new_budget_url = format!(
        "{}?month={}",
        endpoints::NEW_BUDGET_VIEW,
        format_budget_month(month)
    );
    let title = format!("{} {}", month.month(), month.year());

    let content = html! {
        (NavBar::new(endpoints::BUDGETS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-3xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { "Budgets" }
                        p class="text-sm text-gray-500 dark:text-gray-400" data-month="true" { (title) }
                    }

                    a href=(new_budget_url) class=(LINK_STYLE) { "Create Budget" }
                }

                nav class="flex justify-between text-sm"
                {
                    a href=(month_url(previous_month(month))) class=(LINK_STYLE) rel="prev" { "Previous month" }
                    a href=(month_url(next_month(month))) class=(LINK_STYLE) rel="next" { "Next month" }
                }

                ul class="grid gap-4 md:grid-cols-2"
                {
                    @for usage in budgets {
                        (budget_tile(usage, categories.get(&usage.budget.category_id), currency))
                    }

                    @if budgets.is_empty() {
                        li class="rounded border border-dashed border-gray-300 px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400 md:col-span-2"
                        {
                            "No budgets for this month. "
                            a href=(new_budget_url) class=(LINK_STYLE) { "Create a budget" }
                        }
                    }
                }
            }
        }
    };

    base("Budgets", &[], &content)
}
