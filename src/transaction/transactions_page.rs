//! The page listing a user's transactions with filters, totals and pages.
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
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    card::{Card, CardId, get_cards},
    category::{Category, CategoryId, get_categories},
    currency::{Currency, format_currency},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, amount_class,
        base, category_badge, edit_delete_action_links,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, create_pagination_indicators, page_count, pagination_view},
    transaction::core::{
        Totals, Transaction, TransactionFilter, TransactionType, count_transactions, get_totals,
        get_transactions,
    },
    user::{UserID, get_user_profile},
};

/// The most rows a page may show, whatever `per_page` asks for.
const MAX_PAGE_SIZE: u64 = 100;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The filters and page requested in the query string.
///
/// Empty values mean "any", e.g. `?type=&card=3` shows both types for card 3.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TransactionsQuery {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
}

impl TransactionsQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            type_: self.type_,
            category_id: self.category,
            card_id: self.card,
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }

    /// The link to `page` that keeps the current filters.
    fn page_url(&self, page: u64, per_page: u64) -> String {
        let query = TransactionsQuery {
            page: Some(page),
            per_page: Some(per_page),
            ..self.clone()
        };

        match serde_urlencoded::to_string(&query) {
            Ok(query_string) => format!("{}?{query_string}", endpoints::TRANSACTIONS_VIEW),
            Err(error) => {
                tracing::error!("could not encode transactions query {query:?}: {error}");
                format!(
                    "{}?page={page}&per_page={per_page}",
                    endpoints::TRANSACTIONS_VIEW
                )
            }
        }
    }
}

/// Render a page of the user's transactions.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let config = &state.pagination_config;
    let page = query.page.unwrap_or(config.default_page).max(1);
    let per_page = query
        .per_page
        .unwrap_or(config.default_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(per_page);
    let filter = query.filter();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction_count = count_transactions(user_id, &filter, &connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let transactions = get_transactions(
        user_id,
        &filter,
        Some(per_page),
        offset,
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let totals = get_totals(user_id, &filter, &connection)
        .inspect_err(|error| tracing::error!("could not get transaction totals: {error}"))?;
    let categories = get_categories(user_id, &connection)?;
    let cards = get_cards(user_id, &connection)?;
    let currency = get_user_profile(user_id, &connection)?.currency;

    let indicators = create_pagination_indicators(
        page,
        page_count(transaction_count, per_page),
        config.max_pages,
    );
    let pagination = pagination_view(&indicators, |page| query.page_url(page, per_page));

    Ok(transactions_view(TransactionsViewModel {
        query: &query,
        transactions: &transactions,
        categories: &categories,
        cards: &cards,
        totals,
        currency,
        pagination,
    })
    .into_response())
}

struct TransactionsViewModel<'a> {
    query: &'a TransactionsQuery,
    transactions: &'a [Transaction],
    /// All of the user's categories, including inactive ones.
    categories: &'a [Category],
    /// All of the user's cards, including inactive ones.
    cards: &'a [Card],
    totals: Totals,
    currency: Currency,
    pagination: Markup,
}

fn signed_amount(transaction: &Transaction, currency: Currency) -> String {
    let sign = match transaction.type_ {
        TransactionType::Income => "+",
        TransactionType::Expense => "-",
    };

    format!("{sign}{}", format_currency(transaction.amount, currency))
}

fn filter_form(query: &TransactionsQuery, categories: &[Category], cards: &[Card]) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid gap-3 sm:grid-cols-2 lg:grid-cols-6 items-end"
            data-filter-form="true"
        {
            div
            {
                label for="filter-type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="filter-type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[query.type_.is_none()] { "All" }
                    @for type_ in TransactionType::ALL {
                        option value=(type_) selected[query.type_ == Some(type_)] { (type_.label()) }
                    }
                }
            }

            div
            {
                label for="filter-category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="filter-category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[query.category.is_none()] { "All" }
                    @for category in categories {
                        option value=(category.id) selected[query.category == Some(category.id)]
                        {
                            (category.icon.emoji()) " " (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-card" class=(FORM_LABEL_STYLE) { "Card" }
                select id="filter-card" name="card" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[query.card.is_none()] { "All" }
                    @for card in cards {
                        option value=(card.id) selected[query.card == Some(card.id)]
                        {
                            (card.short_name())
                        }
                    }
                }
            }

            div
            {
                label for="filter-date-from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="filter-date-from"
                    type="date"
                    name="date_from"
                    value=[query.date_from.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-date-to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="filter-date-to"
                    type="date"
                    name="date_to"
                    value=[query.date_to.map(|date| date.to_string())]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Reset" }
            }
        }
    }
}

fn totals_view(totals: Totals, currency: Currency) -> Markup {
    let difference = totals.difference();

    html! {
        dl class="grid grid-cols-3 gap-4 text-sm" data-totals="true"
        {
            div
            {
                dt class="text-gray-500 dark:text-gray-400" { "Income" }
                dd class={ "font-semibold tabular-nums " (amount_class(true)) } data-total="income"
                {
                    (format_currency(totals.income, currency))
                }
            }
            div
            {
                dt class="text-gray-500 dark:text-gray-400" { "Expense" }
                dd class={ "font-semibold tabular-nums " (amount_class(false)) } data-total="expense"
                {
                    (format_currency(totals.expense, currency))
                }
            }
            div
            {
                dt class="text-gray-500 dark:text-gray-400" { "Difference" }
                dd class={ "font-semibold tabular-nums " (amount_class(difference >= 0.0)) } data-total="difference"
                {
                    (format_currency(difference, currency))
                }
            }
        }
    }
}

fn transactions_view(model: TransactionsViewModel<'_>) -> Markup {
    let categories_by_id: HashMap<CategoryId, &Category> = model
        .categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let cards_by_id: HashMap<CardId, &Card> =
        model.cards.iter().map(|card| (card.id, card)).collect();

    let table_row = |transaction: &Transaction| {
        let category = transaction
            .category_id
            .and_then(|id| categories_by_id.get(&id));
        let card = transaction.card_id.and_then(|id| cards_by_id.get(&id));
        let edit_url =
            endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
        let delete_url = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
        let is_income = transaction.type_ == TransactionType::Income;

        html! {
            tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    @match category {
                        Some(category) => (category_badge(
                            category.icon.emoji(),
                            category.name.as_ref(),
                            category.color.as_ref(),
                        )),
                        None => span class="text-gray-500 dark:text-gray-400" { "Uncategorised" },
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    @match card {
                        Some(card) => (card.short_name()),
                        None => "Cash",
                    }
                }
                td class={ (TABLE_CELL_STYLE) " text-right tabular-nums " (amount_class(is_income)) }
                {
                    (signed_amount(transaction, model.currency))
                }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            "Are you sure you want to delete this transaction?",
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        }
    };

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }
                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "New Transaction" }
                }

                (filter_form(model.query, model.categories, model.cards))
                (totals_view(model.totals, model.currency))

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Card" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in model.transactions {
                                (table_row(transaction))
                            }

                            @if model.transactions.is_empty() {
                                tr
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        "No transactions found. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Add a transaction"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (model.pagination)
            }
        }
    };

    base("Transactions", &[], &content)
}
