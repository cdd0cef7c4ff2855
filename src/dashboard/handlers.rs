//! HTTP handler and view for the dashboard page.

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

use crate::{
    AppState, Error,
    card::{Card, CardId, get_cards, get_total_balance},
    category::{Category, CategoryId, get_categories},
    currency::{Currency, format_currency},
    dashboard::{
        charts::{DashboardChart, charts_script, charts_view, expenses_by_category_chart},
        period::Period,
        summary::{PeriodSummary, recommendations},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        amount_class, base, category_badge, currency_rounded_with_tooltip,
    },
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{Transaction, TransactionFilter, TransactionType, get_transactions},
    user::{UserID, get_user_by_id, get_user_profile},
};

/// How many of the period's transactions are listed.
const RECENT_TRANSACTION_COUNT: usize = 10;

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Moscow".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The period and card chosen in the query string.
///
/// Both are kept as text so that unknown values fall back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub period: Option<String>,
    pub card: Option<String>,
}

/// How much of the monthly budget from the user's profile has been spent.
struct MonthlyBudgetUsage {
    budget: f64,
    spent: f64,
}

impl MonthlyBudgetUsage {
    fn percent_used(&self) -> f64 {
        self.spent / self.budget * 100.0
    }
}

struct DashboardViewModel<'a> {
    user_name: &'a str,
    period: Period,
    cards: &'a [Card],
    selected_card: Option<&'a Card>,
    balance: f64,
    summary: &'a PeriodSummary,
    budget_usage: Option<MonthlyBudgetUsage>,
    recommendations: Option<Vec<String>>,
    recent_transactions: &'a [Transaction],
    categories: &'a HashMap<CategoryId, Category>,
    charts: &'a [DashboardChart],
    currency: Currency,
}

/// Display a summary of the user's finances for the current week, month or year.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let period = Period::from_query(query.period.as_deref());

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let profile = get_user_profile(user_id, &connection)?;
    let cards = get_cards(user_id, &connection)?;
    // Cards belonging to someone else are ignored rather than reported.
    let selected_card = query
        .card
        .as_deref()
        .and_then(|card| card.trim().parse::<CardId>().ok())
        .and_then(|card_id| cards.iter().find(|card| card.id == card_id));

    let filter = TransactionFilter {
        card_id: selected_card.map(|card| card.id),
        date_from: Some(period.start(today)),
        date_to: Some(today),
        ..Default::default()
    };
    let transactions = get_transactions(user_id, &filter, None, 0, &connection)?;
    let categories = get_categories(user_id, &connection)?
        .into_iter()
        .map(|category| (category.id, category))
        .collect::<HashMap<_, _>>();
    let balance = match selected_card {
        Some(card) => card.balance,
        None => get_total_balance(user_id, &connection)?,
    };
    drop(connection);

    let summary = PeriodSummary::new(&transactions, &categories, today);
    let budget_usage = (period == Period::Month && profile.monthly_budget > 0.0).then(|| {
        MonthlyBudgetUsage {
            budget: profile.monthly_budget,
            spent: summary.totals.expense,
        }
    });
    let recommendations = profile
        .ai_recommendations_enabled
        .then(|| recommendations(&summary, profile.currency));

    let charts = if summary.expenses_by_category.is_empty() {
        Vec::new()
    } else {
        vec![DashboardChart {
            id: "expenses-by-category-chart",
            options: expenses_by_category_chart(&summary.expenses_by_category, profile.currency)
                .to_string(),
        }]
    };

    let recent_count = transactions.len().min(RECENT_TRANSACTION_COUNT);

    Ok(dashboard_view(DashboardViewModel {
        user_name: user.display_name(),
        period,
        cards: &cards,
        selected_card,
        balance,
        summary: &summary,
        budget_usage,
        recommendations,
        recent_transactions: &transactions[..recent_count],
        categories: &categories,
        charts: &charts,
        currency: profile.currency,
    })
    .into_response())
}

fn period_url(period: Period, selected_card: Option<&Card>) -> String {
    match selected_card {
        Some(card) => format!(
            "{}?period={}&card={}",
            endpoints::DASHBOARD_VIEW,
            period.as_str(),
            card.id
        ),
        None => format!("{}?period={}", endpoints::DASHBOARD_VIEW, period.as_str()),
    }
}

fn period_selector(current: Period, selected_card: Option<&Card>) -> Markup {
    html! {
        nav class="flex gap-4" aria-label="Period"
        {
            @for period in Period::ALL {
                @if period == current {
                    span class="font-semibold" aria-current="page" { (period.label()) }
                } @else {
                    a href=(period_url(period, selected_card)) class=(LINK_STYLE) { (period.label()) }
                }
            }
        }
    }
}

fn card_selector(period: Period, cards: &[Card], selected_card: Option<&Card>) -> Markup {
    let selected_id = selected_card.map(|card| card.id);

    html! {
        form method="get" action=(endpoints::DASHBOARD_VIEW) class="flex items-end gap-2"
        {
            input type="hidden" name="period" value=(period.as_str());

            div
            {
                label for="card" class=(FORM_LABEL_STYLE) { "Card" }
                select id="card" name="card" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_id.is_none()] { "All cards" }

                    @for card in cards {
                        option value=(card.id) selected[selected_id == Some(card.id)] {
                            (card.short_name())
                        }
                    }
                }
            }

            button type="submit" class={ "w-auto " (BUTTON_PRIMARY_STYLE) } { "Apply" }
        }
    }
}

fn summary_tile(name: &str, label: &str, amount: String, class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class={ "text-2xl font-bold " (class) } data-summary=(name) { (amount) }
        }
    }
}

fn budget_usage_view(usage: &MonthlyBudgetUsage, currency: Currency) -> Markup {
    let percent_used = usage.percent_used();
    let bar_width = percent_used.clamp(0.0, 100.0);
    let bar_class = if percent_used > 100.0 {
        "bg-red-600"
    } else {
        "bg-blue-600"
    };

    html! {
        section class=(CARD_STYLE) data-monthly-budget="true"
        {
            h2 class="text-lg font-semibold" { "Monthly budget" }
            p
            {
                "Spent " (currency_rounded_with_tooltip(usage.spent, currency))
                " of " (currency_rounded_with_tooltip(usage.budget, currency))
                " (" span data-percent-used="true" { (format!("{percent_used:.0}%")) } ")"
            }
            div class="w-full h-2 mt-2 rounded bg-gray-200 dark:bg-gray-700"
            {
                div class={ "h-2 rounded " (bar_class) } style={ "width: " (format!("{bar_width:.0}")) "%;" } {}
            }
        }
    }
}

fn recommendations_view(messages: &[String]) -> Markup {
    html! {
        section class=(CARD_STYLE) id="recommendations"
        {
            h2 class="text-lg font-semibold" { "Recommendations" }
            ul class="list-disc pl-5"
            {
                @for message in messages {
                    li data-recommendation="true" { (message) }
                }
            }
        }
    }
}

fn recent_transactions_view(
    transactions: &[Transaction],
    categories: &HashMap<CategoryId, Category>,
    currency: Currency,
) -> Markup {
    html! {
        section class="w-full"
        {
            div class="flex justify-between items-center mb-2"
            {
                h2 class="text-lg font-semibold" { "Recent transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "All transactions" }
            }

            @if transactions.is_empty() {
                p { "No transactions in this period." }
            } @else {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            @let is_income = transaction.type_ == TransactionType::Income;
                            @let category = transaction
                                .category_id
                                .and_then(|id| categories.get(&id));

                            tr class=(TABLE_ROW_STYLE) data-recent-transaction="true"
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if let Some(category) = category {
                                        (category_badge(
                                            category.icon.emoji(),
                                            category.name.as_ref(),
                                            category.color.as_ref(),
                                        ))
                                    } @else {
                                        "Uncategorised"
                                    }
                                }
                                td class={ (TABLE_CELL_STYLE) " " (amount_class(is_income)) }
                                {
                                    (format_currency(transaction.balance_effect(), currency))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_view(model: DashboardViewModel<'_>) -> Markup {
    let totals = model.summary.totals;
    let balance_label = match model.selected_card {
        Some(card) => format!("Balance ({})", card.short_name()),
        None => "Balance (all cards)".to_owned(),
    };

    let content = html! {
        (NavBar::new(endpoints::DASHBOARD_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex flex-col gap-4 w-full"
            {
                header class="flex flex-wrap justify-between items-end gap-4"
                {
                    div
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" data-greeting="true"
                        {
                            "Hello, " (model.user_name) "!"
                        }
                        h1 class="text-xl font-bold" data-period-title="true" { (model.period.title()) }
                        (period_selector(model.period, model.selected_card))
                    }

                    (card_selector(model.period, model.cards, model.selected_card))
                }

                section class="grid grid-cols-1 md:grid-cols-3 gap-4"
                {
                    (summary_tile("income", "Income", format_currency(totals.income, model.currency), amount_class(true)))
                    (summary_tile("expense", "Expenses", format_currency(totals.expense, model.currency), amount_class(false)))
                    (summary_tile("balance", &balance_label, format_currency(model.balance, model.currency), ""))
                }

                @if let Some(usage) = &model.budget_usage {
                    (budget_usage_view(usage, model.currency))
                }

                @if let Some(messages) = &model.recommendations {
                    (recommendations_view(messages))
                }

                @if model.charts.is_empty() {
                    p class=(CARD_STYLE) { "No expenses in this period." }
                } @else {
                    (charts_view(model.charts))
                }

                (recent_transactions_view(model.recent_transactions, model.categories, model.currency))
            }
        }
    };

    let scripts = if model.charts.is_empty() {
        Vec::new()
    } else {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(model.charts),
        ]
    };

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::State,
        http::StatusCode,
    };
    use axum_extra::extract::Query;
    use scraper::{Html, Selector};
    use time::{Duration, OffsetDateTime};

    use crate::{
        card::{Card, NewCard, create_card},
        category::{NewCategory, create_category},
        currency::{Currency, format_currency},
        test_utils::{
            assert_valid_html, create_test_user, create_test_user_named, get_test_connection,
            parse_html_document,
        },
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::{UserID, get_user_profile, update_user_profile},
    };

    use super::{DashboardQuery, DashboardState, get_dashboard_page};

    fn get_state() -> (DashboardState, UserID) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        (
            DashboardState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    fn add_card(state: &DashboardState, user_id: UserID, last_four: &str) -> Card {
        create_card(
            user_id,
            &NewCard {
                last_four: last_four.to_owned(),
                ..NewCard::for_test()
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
    }

    fn add_transaction(
        state: &DashboardState,
        user_id: UserID,
        type_: TransactionType,
        amount: f64,
        card_id: Option<i64>,
        days_ago: i64,
    ) {
        create_transaction(
            user_id,
            &NewTransaction {
                type_,
                amount,
                category_id: None,
                card_id,
                date: OffsetDateTime::now_utc().date() - Duration::days(days_ago),
                description: format!("{type_} of {amount}"),
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
    }

    fn query(period: &str, card: Option<String>) -> Query<DashboardQuery> {
        Query(DashboardQuery {
            period: Some(period.to_owned()),
            card,
        })
    }

    fn text_of(html: &Html, selector: &str) -> Option<String> {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .map(|element| element.text().collect::<String>().trim().to_owned())
    }

    fn count(html: &Html, selector: &str) -> usize {
        html.select(&Selector::parse(selector).unwrap()).count()
    }

    async fn render(state: DashboardState, user_id: UserID, query: Query<DashboardQuery>) -> Html {
        let response = get_dashboard_page(State(state), Extension(user_id), query)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[tokio::test]
    async fn shows_period_totals_and_balance() {
        let (state, user_id) = get_state();
        let card = add_card(&state, user_id, "1111");
        add_transaction(&state, user_id, TransactionType::Income, 1000.0, Some(card.id), 0);
        add_transaction(&state, user_id, TransactionType::Expense, 250.0, Some(card.id), 0);
        // Outside every period.
        add_transaction(&state, user_id, TransactionType::Expense, 99.0, None, 400);

        let html = render(state, user_id, Query(DashboardQuery::default())).await;

        assert_eq!(
            text_of(&html, "[data-greeting]").as_deref(),
            Some("Hello, Test!")
        );
        assert_eq!(
            text_of(&html, "[data-period-title]").as_deref(),
            Some("Statistics for the current month")
        );
        assert_eq!(
            text_of(&html, "[data-summary='income']"),
            Some(format_currency(1000.0, Currency::Rub))
        );
        assert_eq!(
            text_of(&html, "[data-summary='expense']"),
            Some(format_currency(250.0, Currency::Rub))
        );
        assert_eq!(
            text_of(&html, "[data-summary='balance']"),
            Some(format_currency(750.0, Currency::Rub))
        );
        assert_eq!(count(&html, "[data-recent-transaction]"), 2);
        assert_eq!(count(&html, "#expenses-by-category-chart"), 1);
    }

    #[tokio::test]
    async fn lists_at_most_ten_recent_transactions() {
        let (state, user_id) = get_state();
        for amount in 1..=12 {
            add_transaction(&state, user_id, TransactionType::Expense, f64::from(amount), None, 0);
        }

        let html = render(state, user_id, query("week", None)).await;

        assert_eq!(count(&html, "[data-recent-transaction]"), 10);
        assert_eq!(
            text_of(&html, "[data-summary='expense']"),
            Some(format_currency(78.0, Currency::Rub))
        );
    }

    #[tokio::test]
    async fn card_filter_limits_transactions_and_balance() {
        let (state, user_id) = get_state();
        let first = add_card(&state, user_id, "1111");
        let second = add_card(&state, user_id, "2222");
        add_transaction(&state, user_id, TransactionType::Income, 100.0, Some(first.id), 0);
        add_transaction(&state, user_id, TransactionType::Income, 40.0, Some(second.id), 0);

        let html = render(state, user_id, query("month", Some(second.id.to_string()))).await;

        assert_eq!(
            text_of(&html, "[data-summary='income']"),
            Some(format_currency(40.0, Currency::Rub))
        );
        assert_eq!(
            text_of(&html, "[data-summary='balance']"),
            Some(format_currency(40.0, Currency::Rub))
        );
        assert_eq!(count(&html, "[data-recent-transaction]"), 1);
    }

    #[tokio::test]
    async fn other_users_card_is_ignored() {
        let (state, user_id) = get_state();
        let other = create_test_user_named("other", &state.db_connection.lock().unwrap());
        let others_card = add_card(&state, other.id, "9999");
        add_transaction(&state, user_id, TransactionType::Income, 100.0, None, 0);

        let html = render(state, user_id, query("month", Some(others_card.id.to_string()))).await;

        assert_eq!(
            text_of(&html, "[data-summary='income']"),
            Some(format_currency(100.0, Currency::Rub))
        );
    }

    #[tokio::test]
    async fn uncategorised_expenses_get_a_recommendation() {
        let (state, user_id) = get_state();
        add_transaction(&state, user_id, TransactionType::Expense, 100.0, None, 0);

        let html = render(state, user_id, query("month", None)).await;

        let recommendations = html
            .select(&Selector::parse("[data-recommendation]").unwrap())
            .map(|element| element.text().collect::<String>())
            .collect::<Vec<_>>();
        assert!(
            recommendations
                .iter()
                .any(|message| message.contains("\"Uncategorised\"")),
            "got {recommendations:?}"
        );
    }

    #[tokio::test]
    async fn hides_recommendations_when_disabled() {
        let (state, user_id) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let mut profile = get_user_profile(user_id, &connection).unwrap();
            profile.ai_recommendations_enabled = false;
            update_user_profile(&profile, &connection).unwrap();
        }

        let html = render(state, user_id, query("month", None)).await;

        assert_eq!(count(&html, "[data-recommendation]"), 0);
    }

    #[tokio::test]
    async fn monthly_budget_usage_only_for_month() {
        let (state, user_id) = get_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let mut profile = get_user_profile(user_id, &connection).unwrap();
            profile.monthly_budget = 1000.0;
            update_user_profile(&profile, &connection).unwrap();
            let food = create_category(
                user_id,
                &NewCategory::for_test("Food", TransactionType::Expense),
                &connection,
            )
            .unwrap();
            create_transaction(
                user_id,
                &NewTransaction {
                    type_: TransactionType::Expense,
                    amount: 250.0,
                    category_id: Some(food.id),
                    card_id: None,
                    date: OffsetDateTime::now_utc().date(),
                    description: String::new(),
                },
                &connection,
            )
            .unwrap();
        }

        let html = render(state.clone(), user_id, query("month", None)).await;
        assert_eq!(text_of(&html, "[data-percent-used]").as_deref(), Some("25%"));
        let spent = html
            .select(&Selector::parse("[data-monthly-budget] span[title]").unwrap())
            .next()
            .expect("No spent amount");
        assert_eq!(
            spent.value().attr("title"),
            Some(format_currency(250.0, Currency::Rub).as_str())
        );

        let html = render(state, user_id, query("year", None)).await;
        assert_eq!(count(&html, "[data-monthly-budget]"), 0);
    }

    #[tokio::test]
    async fn no_chart_without_expenses() {
        let (state, user_id) = get_state();

        let html = render(state, user_id, query("decade", None)).await;

        assert_eq!(count(&html, "#expenses-by-category-chart"), 0);
        assert_eq!(
            text_of(&html, "[data-period-title]").as_deref(),
            Some("Statistics for the current month")
        );
    }
}
