//! Income and expense categories for grouping transactions and budgets.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_transactions_per_category, create_category, create_category_table, delete_category,
    get_active_categories, get_categories, get_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    Category, CategoryColor, CategoryFormData, CategoryIcon, CategoryId, CategoryName, NewCategory,
};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;

#[cfg(test)]
pub use db::set_category_active;
