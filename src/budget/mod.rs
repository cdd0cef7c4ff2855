//! Monthly budgets per expense category and how much of each has been spent.

mod budgets_page;
mod core;
mod create;
mod delete;
mod edit;
mod form;

pub use budgets_page::get_budgets_page;
pub use core::{
    Budget, BudgetId, BudgetUsage, NewBudget, create_budget, create_budget_table, delete_budget,
    format_budget_month, get_budget, get_budgets_for_month, month_start, parse_budget_month,
    update_budget,
};
pub use create::{create_budget_endpoint, get_new_budget_page};
pub use delete::delete_budget_endpoint;
pub use edit::{get_edit_budget_page, update_budget_endpoint};
pub use form::BudgetFormData;
