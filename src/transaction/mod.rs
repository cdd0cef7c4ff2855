//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions that keep card balances in step with it
//! - The form shared by the new and edit pages
//! - Route handlers for listing, creating, editing and deleting transactions

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod transactions_page;

pub use core::{
    NewTransaction, Totals, Transaction, TransactionFilter, TransactionId, TransactionType,
    balance_effect, count_transactions, create_transaction, create_transaction_table,
    delete_transaction, get_totals, get_transaction, get_transactions, update_transaction,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use form::TransactionFormData;
pub use transactions_page::get_transactions_page;
