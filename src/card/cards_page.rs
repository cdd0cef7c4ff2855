//! The page listing a user's cards.

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
    card::{Card, get_cards},
    currency::{Currency, format_currency},
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links},
    navigation::NavBar,
    user::{UserID, get_user_profile},
};

/// The state needed for the cards page.
#[derive(Debug, Clone)]
pub struct CardsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CardsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the user's cards and their total balance.
pub async fn get_cards_page(
    State(state): State<CardsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let cards = get_cards(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get cards of user {user_id}: {error}"))?;
    let currency = get_user_profile(user_id, &connection)?.currency;

    Ok(cards_view(&cards, currency).into_response())
}

fn card_tile(card: &Card, currency: Currency) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_CARD_VIEW, card.id);
    let delete_url = endpoints::format_endpoint(endpoints::CARD, card.id);
    let new_transaction_url = format!("{}?card={}", endpoints::NEW_TRANSACTION_VIEW, card.id);
    let confirm_message = format!(
        "Are you sure you want to delete the card ending in {}? \
        Its transactions will be kept as cash transactions.",
        card.last_four
    );

    html! {
        li class=(CARD_STYLE) data-card="true"
        {
            div class="flex items-start justify-between gap-3"
            {
                div
                {
                    p class="font-mono text-lg tracking-wider" { (card.masked_number()) }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (card.card_holder) " · " (card.card_system.label()) " · " (card.card_type.label())
                    }
                }

                @if !card.is_active {
                    span class="rounded bg-gray-200 px-2 py-0.5 text-xs dark:bg-gray-700" { "Inactive" }
                }
            }

            p class="mt-3 text-2xl font-semibold tabular-nums" data-balance="true"
            {
                (format_currency(card.balance, currency))
            }

            div class="mt-3 flex flex-wrap items-center gap-4 text-sm"
            {
                @if card.is_active {
                    a href=(new_transaction_url) class=(LINK_STYLE) { "Add transaction" }
                }

                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest [data-card='true']",
                    "outerHTML",
                ))
            }
        }
    }
}

fn cards_view(cards: &[Card], currency: Currency) -> Markup {
    let total_balance: f64 = cards.iter().map(|card| card.balance).sum();

    let content = html! {
        (NavBar::new(endpoints::CARDS_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-3xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { "Cards" }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            "Total balance: "
                            span data-total-balance="true" { (format_currency(total_balance, currency)) }
                        }
                    }

                    a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Add Card" }
                }

                ul class="grid gap-4 md:grid-cols-2"
                {
                    @for card in cards {
                        (card_tile(card, currency))
                    }

                    @if cards.is_empty() {
                        li class="rounded border border-dashed border-gray-300 px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:text-gray-400 md:col-span-2"
                        {
                            "No cards added yet. "
                            a href=(endpoints::NEW_CARD_VIEW) class=(LINK_STYLE) { "Add your first card" }
                        }
                    }
                }
            }
        }
    };

    base("Cards", &[], &content)
}
