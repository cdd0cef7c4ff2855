//! Transactions and the queries that keep card balances in step with them.
//!
//! Every write goes through a SQLite transaction so that the transaction row
//! and the balance of the card it was paid with change together or not at all.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, card::CardId, category::CategoryId, user::UserID};

pub type TransactionId = i64;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    /// Both types, in the order they are offered in forms.
    pub const ALL: [TransactionType; 2] = [TransactionType::Expense, TransactionType::Income];

    /// The value stored in the database and sent in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// How a transaction of `type_` changes the balance of the card it was made with.
pub fn balance_effect(type_: TransactionType, amount: f64) -> f64 {
    match type_ {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

/// An income or expense recorded by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    pub type_: TransactionType,
    /// Always greater than zero, the type gives the direction.
    pub amount: f64,
    /// `None` for uncategorised transactions.
    pub category_id: Option<CategoryId>,
    /// `None` for cash transactions.
    pub card_id: Option<CardId>,
    pub date: Date,
    pub description: String,
    pub created_at: OffsetDateTime,
}

impl Transaction {
    pub fn balance_effect(&self) -> f64 {
        balance_effect(self.type_, self.amount)
    }
}

/// The fields of a transaction the user can set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub type_: TransactionType,
    pub amount: f64,
    pub category_id: Option<CategoryId>,
    pub card_id: Option<CardId>,
    pub date: Date,
    pub description: String,
}

impl NewTransaction {
    /// Check the amount and date and trim the description.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::NonPositiveAmount] if the amount is not a number greater than zero,
    /// - [Error::FutureDate] if the date is after `today`.
    pub fn validated(self, today: Date) -> Result<Self, Error> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(Error::NonPositiveAmount(self.amount));
        }

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(Self {
            description: self.description.trim().to_owned(),
            ..self
        })
    }
}

/// Narrows down which of a user's transactions a query returns.
///
/// `None` fields match everything. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub type_: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub card_id: Option<CardId>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

/// The sums of income and expense over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
}

impl Totals {
    /// Income minus expense.
    pub fn difference(&self) -> f64 {
        self.income - self.expense
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            amount REAL NOT NULL CHECK (amount > 0),
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            card_id INTEGER REFERENCES card(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Record a transaction and apply its effect to the card it was made with.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidCategory] or [Error::CategoryTypeMismatch] if the
///   category is not one of the user's active categories of the same type,
/// - [Error::InvalidCard] if the card does not belong to the user,
/// - [Error::SqlError] if some other SQL error occurred.
///
/// Nothing is written if an error is returned.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    check_references(user_id, new_transaction, None, &sql_transaction)?;

    let created_at = OffsetDateTime::now_utc();
    let id = sql_transaction.query_row(
        "INSERT INTO \"transaction\"
            (user_id, type, amount, category_id, card_id, date, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING id",
        (
            user_id.as_i64(),
            new_transaction.type_,
            new_transaction.amount,
            new_transaction.category_id,
            new_transaction.card_id,
            new_transaction.date,
            &new_transaction.description,
            created_at,
        ),
        |row| row.get(0),
    )?;

    apply_balance_effect(
        user_id,
        new_transaction.card_id,
        balance_effect(new_transaction.type_, new_transaction.amount),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        user_id,
        type_: new_transaction.type_,
        amount: new_transaction.amount,
        category_id: new_transaction.category_id,
        card_id: new_transaction.card_id,
        date: new_transaction.date,
        description: new_transaction.description.clone(),
        created_at,
    })
}

const SELECT_TRANSACTION: &str = "SELECT id, user_id, type, amount, category_id, card_id, date,
    description, created_at FROM \"transaction\"";

/// Get one of the user's transactions.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn get_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((transaction_id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Overwrite a transaction, moving its effect from the old card to the new one.
///
/// The old effect is reversed on the old card before the new effect is
/// applied to the new card, so changing the amount, the type or the card all
/// leave every balance as if the transaction had always been the new one.
///
/// The transaction may keep its current category even if that category has
/// been deactivated since.
///
/// # Errors
///
/// Returns [Error::UpdateMissingTransaction] if the user has no such
/// transaction, and the same reference errors as [create_transaction].
pub fn update_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = match get_transaction(user_id, transaction_id, &sql_transaction) {
        Ok(old) => old,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    check_references(user_id, new_transaction, old.category_id, &sql_transaction)?;

    apply_balance_effect(
        user_id,
        old.card_id,
        -old.balance_effect(),
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "UPDATE \"transaction\"
         SET type = ?1, amount = ?2, category_id = ?3, card_id = ?4, date = ?5, description = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            new_transaction.type_,
            new_transaction.amount,
            new_transaction.category_id,
            new_transaction.card_id,
            new_transaction.date,
            &new_transaction.description,
            transaction_id,
            user_id.as_i64(),
        ),
    )?;

    apply_balance_effect(
        user_id,
        new_transaction.card_id,
        balance_effect(new_transaction.type_, new_transaction.amount),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        type_: new_transaction.type_,
        amount: new_transaction.amount,
        category_id: new_transaction.category_id,
        card_id: new_transaction.card_id,
        date: new_transaction.date,
        description: new_transaction.description.clone(),
        ..old
    })
}

/// Delete a transaction and reverse its effect on its card.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the user has no such transaction.
pub fn delete_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = match get_transaction(user_id, transaction_id, &sql_transaction) {
        Ok(old) => old,
        Err(Error::NotFound) => return Err(Error::DeleteMissingTransaction),
        Err(error) => return Err(error),
    };

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    apply_balance_effect(
        user_id,
        old.card_id,
        -old.balance_effect(),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(())
}

/// The `WHERE` clause shared by the filtered queries, parameters ?1 to ?6.
const FILTER_CLAUSE: &str = "\"transaction\".user_id = ?1
    AND (?2 IS NULL OR \"transaction\".type = ?2)
    AND (?3 IS NULL OR \"transaction\".category_id = ?3)
    AND (?4 IS NULL OR \"transaction\".card_id = ?4)
    AND (?5 IS NULL OR \"transaction\".date >= ?5)
    AND (?6 IS NULL OR \"transaction\".date <= ?6)";

type FilterParams = (
    i64,
    Option<TransactionType>,
    Option<CategoryId>,
    Option<CardId>,
    Option<Date>,
    Option<Date>,
);

fn filter_params(user_id: UserID, filter: &TransactionFilter) -> FilterParams {
    (
        user_id.as_i64(),
        filter.type_,
        filter.category_id,
        filter.card_id,
        filter.date_from,
        filter.date_to,
    )
}

/// Get the user's transactions that match `filter`, newest first.
///
/// Transactions on the same date are ordered by most recently created.
/// Pass `limit = None` for all matching transactions.
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    limit: Option<u64>,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // SQLite treats a negative limit as no limit.
    let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let (user_id, type_, category_id, card_id, date_from, date_to) =
        filter_params(user_id, filter);

    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE {FILTER_CLAUSE}
             ORDER BY date DESC, id DESC
             LIMIT ?7 OFFSET ?8"
        ))?
        .query_map(
            (
                user_id,
                type_,
                category_id,
                card_id,
                date_from,
                date_to,
                limit,
                offset,
            ),
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Count the user's transactions that match `filter`.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    connection
        .query_row(
            &format!("SELECT COUNT(id) FROM \"transaction\" WHERE {FILTER_CLAUSE}"),
            filter_params(user_id, filter),
            |row| row.get::<_, i64>(0),
        )
        .map(|count| u64::try_from(count).unwrap_or_default())
        .map_err(Error::from)
}

/// Sum income and expense over the user's transactions that match `filter`.
pub fn get_totals(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Totals, Error> {
    connection
        .query_row(
            &format!(
                "SELECT
                    COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0),
                    COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0)
                 FROM \"transaction\" WHERE {FILTER_CLAUSE}"
            ),
            filter_params(user_id, filter),
            |row| {
                Ok(Totals {
                    income: row.get(0)?,
                    expense: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
}

/// Check that the category and card of `new_transaction` may be used by `user_id`.
///
/// `current_category_id` is the category the transaction already has, which
/// it may keep even if the category has been deactivated.
fn check_references(
    user_id: UserID,
    new_transaction: &NewTransaction,
    current_category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    if let Some(category_id) = new_transaction.category_id {
        let (category_type, is_active): (TransactionType, bool) = connection
            .query_row(
                "SELECT type, is_active FROM category WHERE id = ?1 AND user_id = ?2",
                (category_id, user_id.as_i64()),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::InvalidCategory,
                error => error.into(),
            })?;

        if category_type != new_transaction.type_ {
            return Err(Error::CategoryTypeMismatch);
        }

        if !is_active && current_category_id != Some(category_id) {
            return Err(Error::InvalidCategory);
        }
    }

    if let Some(card_id) = new_transaction.card_id {
        let is_owned: bool = connection.query_row(
            "SELECT EXISTS (SELECT 1 FROM card WHERE id = ?1 AND user_id = ?2)",
            (card_id, user_id.as_i64()),
            |row| row.get(0),
        )?;

        if !is_owned {
            return Err(Error::InvalidCard);
        }
    }

    Ok(())
}

fn apply_balance_effect(
    user_id: UserID,
    card_id: Option<CardId>,
    effect: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(card_id) = card_id else {
        return Ok(());
    };

    connection.execute(
        "UPDATE card SET balance = balance + ?1 WHERE id = ?2 AND user_id = ?3",
        (effect, card_id, user_id.as_i64()),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        type_: row.get(2)?,
        amount: row.get(3)?,
        category_id: row.get(4)?,
        card_id: row.get(5)?,
        date: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
    })
}


#[cfg(test)]
mod reconciliation_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        card::{Card, CardId, NewCard, create_card, get_card},
        category::{CategoryId, NewCategory, create_category, set_category_active},
        test_utils::{create_test_user, create_test_user_named, get_test_connection},
        user::UserID,
    };

    use super::{
        NewTransaction, TransactionType, create_transaction, delete_transaction, get_transaction,
        update_transaction,
    };

    fn card_for(user_id: UserID, balance: f64, connection: &Connection) -> Card {
        create_card(
            user_id,
            &NewCard {
                balance,
                ..NewCard::for_test()
            },
            connection,
        )
        .expect("Could not create test card")
    }

    fn category_for(
        user_id: UserID,
        name: &str,
        type_: TransactionType,
        connection: &Connection,
    ) -> CategoryId {
        create_category(user_id, &NewCategory::for_test(name, type_), connection)
            .expect("Could not create test category")
            .id
    }

    fn balance(user_id: UserID, card_id: CardId, connection: &Connection) -> f64 {
        get_card(user_id, card_id, connection).unwrap().balance
    }

    fn transaction(
        type_: TransactionType,
        amount: f64,
        category_id: Option<CategoryId>,
        card_id: Option<CardId>,
    ) -> NewTransaction {
        NewTransaction {
            type_,
            amount,
            category_id,
            card_id,
            date: date!(2025 - 03 - 10),
            description: String::new(),
        }
    }

    #[test]
    fn income_adds_to_card_and_expense_subtracts() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 1000.0, &connection);

        create_transaction(
            user.id,
            &transaction(TransactionType::Income, 500.0, None, Some(card.id)),
            &connection,
        )
        .unwrap();
        assert_eq!(balance(user.id, card.id, &connection), 1500.0);

        create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 200.0, None, Some(card.id)),
            &connection,
        )
        .unwrap();
        assert_eq!(balance(user.id, card.id, &connection), 1300.0);
    }

    #[test]
    fn cash_transaction_touches_no_card() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 1000.0, &connection);

        create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 200.0, None, None),
            &connection,
        )
        .unwrap();

        assert_eq!(balance(user.id, card.id, &connection), 1000.0);
    }

    #[test]
    fn update_moves_effect_between_cards_and_types() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let first = card_for(user.id, 1000.0, &connection);
        let second = card_for(user.id, 0.0, &connection);
        let created = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 300.0, None, Some(first.id)),
            &connection,
        )
        .unwrap();
        assert_eq!(balance(user.id, first.id, &connection), 700.0);

        update_transaction(
            user.id,
            created.id,
            &transaction(TransactionType::Income, 50.0, None, Some(second.id)),
            &connection,
        )
        .unwrap();

        assert_eq!(balance(user.id, first.id, &connection), 1000.0);
        assert_eq!(balance(user.id, second.id, &connection), 50.0);
        let got = get_transaction(user.id, created.id, &connection).unwrap();
        assert_eq!(got.type_, TransactionType::Income);
        assert_eq!(got.amount, 50.0);
        assert_eq!(got.card_id, Some(second.id));
    }

    #[test]
    fn update_to_cash_only_reverses() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 100.0, &connection);
        let created = create_transaction(
            user.id,
            &transaction(TransactionType::Income, 40.0, None, Some(card.id)),
            &connection,
        )
        .unwrap();

        update_transaction(
            user.id,
            created.id,
            &transaction(TransactionType::Income, 40.0, None, None),
            &connection,
        )
        .unwrap();

        assert_eq!(balance(user.id, card.id, &connection), 100.0);
    }

    #[test]
    fn delete_reverses_effect() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 100.0, &connection);
        let created = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, None, Some(card.id)),
            &connection,
        )
        .unwrap();

        delete_transaction(user.id, created.id, &connection).unwrap();

        assert_eq!(balance(user.id, card.id, &connection), 100.0);
        assert_eq!(
            get_transaction(user.id, created.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn another_users_card_is_rejected_without_side_effects() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        let other_card = card_for(other.id, 100.0, &connection);

        let result = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, None, Some(other_card.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCard));
        assert_eq!(balance(other.id, other_card.id, &connection), 100.0);
    }

    #[test]
    fn another_users_category_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        let category_id = category_for(other.id, "Food", TransactionType::Expense, &connection);

        let result = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, Some(category_id), None),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory));
    }

    #[test]
    fn category_of_wrong_type_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 100.0, &connection);
        let salary = category_for(user.id, "Salary", TransactionType::Income, &connection);

        let result = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, Some(salary), Some(card.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::CategoryTypeMismatch));
        assert_eq!(balance(user.id, card.id, &connection), 100.0);
    }

    #[test]
    fn inactive_category_is_rejected_for_new_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = category_for(user.id, "Food", TransactionType::Expense, &connection);
        set_category_active(user.id, food, false, &connection).unwrap();

        let result = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, Some(food), None),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory));
    }

    #[test]
    fn transaction_may_keep_its_deactivated_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = category_for(user.id, "Food", TransactionType::Expense, &connection);
        let created = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 60.0, Some(food), None),
            &connection,
        )
        .unwrap();
        set_category_active(user.id, food, false, &connection).unwrap();

        let result = update_transaction(
            user.id,
            created.id,
            &transaction(TransactionType::Expense, 80.0, Some(food), None),
            &connection,
        );

        assert!(result.is_ok(), "got {result:?}");
    }

    #[test]
    fn failed_update_leaves_balances_unchanged() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = card_for(user.id, 100.0, &connection);
        let salary = category_for(user.id, "Salary", TransactionType::Income, &connection);
        let created = create_transaction(
            user.id,
            &transaction(TransactionType::Expense, 30.0, None, Some(card.id)),
            &connection,
        )
        .unwrap();

        let result = update_transaction(
            user.id,
            created.id,
            &transaction(TransactionType::Expense, 90.0, Some(salary), Some(card.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::CategoryTypeMismatch));
        assert_eq!(balance(user.id, card.id, &connection), 70.0);
    }

    #[test]
    fn update_and_delete_of_other_users_transaction_fail() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        let created = create_transaction(
            other.id,
            &transaction(TransactionType::Expense, 30.0, None, None),
            &connection,
        )
        .unwrap();

        assert_eq!(
            update_transaction(
                user.id,
                created.id,
                &transaction(TransactionType::Expense, 1.0, None, None),
                &connection
            ),
            Err(Error::UpdateMissingTransaction)
        );
        assert_eq!(
            delete_transaction(user.id, created.id, &connection),
            Err(Error::DeleteMissingTransaction)
        );
    }
}
