//! The dashboard: a summary of the user's income, spending and balance for the
//! current week, month or year, with a chart of expenses by category and
//! spending recommendations.

mod charts;
mod handlers;
mod period;
mod summary;

pub use handlers::get_dashboard_page;
