//! Monthly spending limits per expense category.

use rusqlite::{Connection, Row};
use time::{Date, Duration, Month};

use crate::{
    Error,
    category::CategoryId,
    transaction::TransactionType,
    user::UserID,
};

pub type BudgetId = i64;

/// A limit on how much the user wants to spend in a category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub amount: f64,
    /// The first day of the month the budget applies to.
    pub month: Date,
}

/// The fields of a budget the user can set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub amount: f64,
    /// Any day in the month, it is stored as the first of the month.
    pub month: Date,
}

/// A budget together with how much has been spent against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUsage {
    pub budget: Budget,
    /// The sum of the month's expense transactions in the budget's category.
    pub spent: f64,
}

impl BudgetUsage {
    /// What is left to spend, negative once the budget is exceeded.
    pub fn remaining(&self) -> f64 {
        self.budget.amount - self.spent
    }

    /// The share of the budget spent, as a percentage. May exceed 100.
    pub fn percent_used(&self) -> f64 {
        if self.budget.amount > 0.0 {
            self.spent / self.budget.amount * 100.0
        } else {
            0.0
        }
    }
}

/// The first day of the month `date` falls in.
pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Parse a month of the form "YYYY-MM", as sent by `<input type="month">`,
/// into the first day of that month.
///
/// # Errors
///
/// Returns [Error::InvalidBudgetMonth] if `text` is not a valid month.
pub fn parse_budget_month(text: &str) -> Result<Date, Error> {
    let invalid = || Error::InvalidBudgetMonth(text.to_owned());

    let (year, month) = text.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())
}

/// Format the month of `date` as "YYYY-MM".
pub fn format_budget_month(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// The first day of the month before the month of `date`.
pub fn previous_month(date: Date) -> Date {
    month_start(month_start(date) - Duration::days(1))
}

/// The first day of the month after the month of `date`.
pub fn next_month(date: Date) -> Date {
    // 31 days past the 1st always lands in the next month.
    month_start(month_start(date) + Duration::days(31))
}

impl NewBudget {
    /// Check the amount and move the month to its first day.
    ///
    /// # Errors
    ///
    /// Returns [Error::NonPositiveAmount] if the amount is not a number greater than zero.
    pub fn validated(self) -> Result<Self, Error> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(Error::NonPositiveAmount(self.amount));
        }

        Ok(Self {
            month: month_start(self.month),
            ..self
        })
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            amount REAL NOT NULL CHECK (amount > 0),
            month TEXT NOT NULL,
            UNIQUE(user_id, category_id, month)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_user_month ON budget(user_id, month);",
    )
}

/// Create a budget for one of the user's active expense categories.
///
/// # Errors
///
/// Returns a:
/// - [Error::NonPositiveAmount] if the amount is not greater than zero,
/// - [Error::InvalidCategory] if the category is not one of the user's active expense categories,
/// - [Error::DuplicateBudget] if there already is a budget for the category and month,
/// - [Error::SqlError] if some other SQL error occurred.
pub fn create_budget(
    user_id: UserID,
    new_budget: &NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let new_budget = new_budget.clone().validated()?;
    check_category(user_id, new_budget.category_id, None, connection)?;

    let id = connection.query_row(
        "INSERT INTO budget (user_id, category_id, amount, month)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        (
            user_id.as_i64(),
            new_budget.category_id,
            new_budget.amount,
            new_budget.month,
        ),
        |row| row.get(0),
    )?;

    Ok(Budget {
        id,
        user_id,
        category_id: new_budget.category_id,
        amount: new_budget.amount,
        month: new_budget.month,
    })
}

const SELECT_BUDGET: &str = "SELECT id, user_id, category_id, amount, month FROM budget";

/// Retrieve one of the user's budgets.
pub fn get_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((budget_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's budgets for the month of `month` and how much has been
/// spent against each, ordered by category name.
pub fn get_budgets_for_month(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Vec<BudgetUsage>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.amount, b.month,
                COALESCE((
                    SELECT SUM(t.amount) FROM \"transaction\" t
                    WHERE t.user_id = b.user_id
                        AND t.category_id = b.category_id
                        AND t.type = ?3
                        AND t.date >= b.month
                        AND t.date < date(b.month, '+1 month')
                ), 0)
             FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.user_id = ?1 AND b.month = ?2
             ORDER BY c.name ASC",
        )?
        .query_map(
            (user_id.as_i64(), month_start(month), TransactionType::Expense),
            |row| {
                Ok(BudgetUsage {
                    budget: map_row(row)?,
                    spent: row.get(5)?,
                })
            },
        )?
        .map(|maybe_usage| maybe_usage.map_err(Error::from))
        .collect()
}

/// Overwrite one of the user's budgets.
///
/// The budget may keep its current category even if it has been deactivated since.
///
/// # Errors
///
/// Returns [Error::UpdateMissingBudget] if the user has no such budget, and
/// the same errors as [create_budget] otherwise.
pub fn update_budget(
    user_id: UserID,
    budget_id: BudgetId,
    new_budget: &NewBudget,
    connection: &Connection,
) -> Result<(), Error> {
    let new_budget = new_budget.clone().validated()?;
    let current = match get_budget(user_id, budget_id, connection) {
        Ok(budget) => budget,
        Err(Error::NotFound) => return Err(Error::UpdateMissingBudget),
        Err(error) => return Err(error),
    };
    check_category(
        user_id,
        new_budget.category_id,
        Some(current.category_id),
        connection,
    )?;

    connection.execute(
        "UPDATE budget SET category_id = ?1, amount = ?2, month = ?3 WHERE id = ?4 AND user_id = ?5",
        (
            new_budget.category_id,
            new_budget.amount,
            new_budget.month,
            budget_id,
            user_id.as_i64(),
        ),
    )?;

    Ok(())
}

/// Delete one of the user's budgets.
///
/// # Errors
///
/// Returns [Error::DeleteMissingBudget] if the user has no such budget.
pub fn delete_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn check_category(
    user_id: UserID,
    category_id: CategoryId,
    current_category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    let (type_, is_active): (TransactionType, bool) = connection
        .query_row(
            "SELECT type, is_active FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidCategory,
            error => error.into(),
        })?;

    let may_keep_inactive = current_category_id == Some(category_id);
    if type_ != TransactionType::Expense || !(is_active || may_keep_inactive) {
        return Err(Error::InvalidCategory);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        amount: row.get(3)?,
        month: row.get(4)?,
    })
}
