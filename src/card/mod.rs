//! Payment cards: listing, adding, editing and removing them.

mod cards_page;
mod core;
mod create;
mod delete;
mod edit;
mod form;

pub use cards_page::get_cards_page;
pub use core::{
    Card, CardId, CardSystem, CardType, NewCard, create_card, create_card_table, delete_card,
    get_card, get_cards, get_total_balance, parse_card_number, update_card,
};
pub use create::{create_card_endpoint, get_new_card_page};
pub use delete::delete_card_endpoint;
pub use edit::{get_edit_card_page, update_card_endpoint};
pub use form::CardFormData;
