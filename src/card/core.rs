//! Payment cards and their balances.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, user::UserID};

/// Database identifier for a card.
pub type CardId = i64;

/// The payment network of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSystem {
    #[default]
    Visa,
    Mastercard,
    Mir,
    UnionPay,
    Other,
}

impl CardSystem {
    pub const ALL: [CardSystem; 5] = [
        CardSystem::Visa,
        CardSystem::Mastercard,
        CardSystem::Mir,
        CardSystem::UnionPay,
        CardSystem::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardSystem::Visa => "visa",
            CardSystem::Mastercard => "mastercard",
            CardSystem::Mir => "mir",
            CardSystem::UnionPay => "unionpay",
            CardSystem::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardSystem::Visa => "Visa",
            CardSystem::Mastercard => "Mastercard",
            CardSystem::Mir => "Mir",
            CardSystem::UnionPay => "UnionPay",
            CardSystem::Other => "Other",
        }
    }
}

/// Whether the card spends the holder's own money or borrowed money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Debit,
    Credit,
}

impl CardType {
    pub const ALL: [CardType; 2] = [CardType::Debit, CardType::Credit];

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Debit => "debit",
            CardType::Credit => "credit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardType::Debit => "Debit",
            CardType::Credit => "Credit",
        }
    }
}

macro_rules! impl_sql_for_enum {
    ($type_:ty) => {
        impl ToSql for $type_ {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $type_ {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;

                <$type_>::ALL
                    .into_iter()
                    .find(|variant| variant.as_str() == text)
                    .ok_or(FromSqlError::InvalidType)
            }
        }

        impl Display for $type_ {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

impl_sql_for_enum!(CardSystem);
impl_sql_for_enum!(CardType);

/// A payment card owned by a user.
///
/// Only the last four digits of the card number are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserID,
    pub card_holder: String,
    pub last_four: String,
    pub card_system: CardSystem,
    pub card_type: CardType,
    pub balance: f64,
    /// Inactive cards are not offered for new transactions.
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl Card {
    /// The card number as it is shown to users, e.g. "**** **** **** 1234".
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last_four)
    }

    /// A short name for select inputs, e.g. "Visa •••• 1234".
    pub fn short_name(&self) -> String {
        format!("{} •••• {}", self.card_system.label(), self.last_four)
    }
}

/// The fields of a card the user can set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCard {
    pub card_holder: String,
    pub last_four: String,
    pub card_system: CardSystem,
    pub card_type: CardType,
    pub balance: f64,
    pub is_active: bool,
}

#[cfg(test)]
impl NewCard {
    pub fn for_test() -> Self {
        Self {
            card_holder: "IVAN PETROV".to_owned(),
            last_four: "4242".to_owned(),
            card_system: CardSystem::Visa,
            card_type: CardType::Debit,
            balance: 0.0,
            is_active: true,
        }
    }
}

/// Check a card number typed by a user and return its last four digits.
///
/// Spaces between digit groups are ignored.
///
/// # Errors
///
/// Returns [Error::InvalidCardNumber] unless the number has between 12 and 19 digits
/// and nothing else besides spaces.
pub fn parse_card_number(raw_number: &str) -> Result<String, Error> {
    let digits = raw_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();

    if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidCardNumber);
    }

    Ok(digits[digits.len() - 4..].to_owned())
}

pub fn create_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS card (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            card_holder TEXT NOT NULL,
            last_four TEXT NOT NULL,
            card_system TEXT NOT NULL,
            card_type TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_card_user ON card(user_id);",
    )?;

    Ok(())
}

/// Add a card for the user.
pub fn create_card(
    user_id: UserID,
    new_card: &NewCard,
    connection: &Connection,
) -> Result<Card, Error> {
    let created_at = OffsetDateTime::now_utc();

    let id = connection.query_row(
        "INSERT INTO card
            (user_id, card_holder, last_four, card_system, card_type, balance, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING id",
        (
            user_id.as_i64(),
            &new_card.card_holder,
            &new_card.last_four,
            new_card.card_system,
            new_card.card_type,
            new_card.balance,
            new_card.is_active,
            created_at,
        ),
        |row| row.get(0),
    )?;

    Ok(Card {
        id,
        user_id,
        card_holder: new_card.card_holder.clone(),
        last_four: new_card.last_four.clone(),
        card_system: new_card.card_system,
        card_type: new_card.card_type,
        balance: new_card.balance,
        is_active: new_card.is_active,
        created_at,
    })
}

const SELECT_CARD: &str = "SELECT id, user_id, card_holder, last_four, card_system, card_type,
    balance, is_active, created_at FROM card";

/// Get one of the user's cards.
pub fn get_card(user_id: UserID, card_id: CardId, connection: &Connection) -> Result<Card, Error> {
    connection
        .prepare(&format!("{SELECT_CARD} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((card_id, user_id.as_i64()), map_card_row)
        .map_err(|error| error.into())
}

/// Get all of the user's cards, active cards first and then oldest first.
pub fn get_cards(user_id: UserID, connection: &Connection) -> Result<Vec<Card>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CARD} WHERE user_id = ?1 ORDER BY is_active DESC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_card_row)?
        .map(|maybe_card| maybe_card.map_err(Error::from))
        .collect()
}

/// Overwrite one of the user's cards, including its balance.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCard] if the user has no such card.
pub fn update_card(
    user_id: UserID,
    card_id: CardId,
    card: &NewCard,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE card
         SET card_holder = ?1, last_four = ?2, card_system = ?3, card_type = ?4,
             balance = ?5, is_active = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            &card.card_holder,
            &card.last_four,
            card.card_system,
            card.card_type,
            card.balance,
            card.is_active,
            card_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCard);
    }

    Ok(())
}

/// Delete one of the user's cards. Its transactions are kept as cash transactions.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCard] if the user has no such card.
pub fn delete_card(user_id: UserID, card_id: CardId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM card WHERE id = ?1 AND user_id = ?2",
        (card_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCard);
    }

    Ok(())
}

/// The sum of the balances of all the user's cards.
pub fn get_total_balance(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM card WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn map_card_row(row: &Row) -> Result<Card, rusqlite::Error> {
    Ok(Card {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        card_holder: row.get(2)?,
        last_four: row.get(3)?,
        card_system: row.get(4)?,
        card_type: row.get(5)?,
        balance: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}


#[cfg(test)]
mod card_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        card::{CardType, NewCard, create_card, delete_card, get_card, get_cards, update_card},
        test_utils::{create_test_user, create_test_user_named, get_test_connection},
        transaction::{NewTransaction, TransactionType, create_transaction, get_transaction},
    };

    use super::get_total_balance;

    #[test]
    fn create_and_get_card() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        let card = create_card(user.id, &NewCard::for_test(), &connection).unwrap();

        assert!(card.id > 0);
        assert_eq!(card.masked_number(), "**** **** **** 4242");
        let got = get_card(user.id, card.id, &connection).unwrap();
        assert_eq!(got.id, card.id);
        assert_eq!(got.card_holder, "IVAN PETROV");
        assert_eq!(got.last_four, "4242");
        assert!(got.is_active);
    }

    #[test]
    fn cards_are_private_to_their_owner() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        let card = create_card(other.id, &NewCard::for_test(), &connection).unwrap();

        assert_eq!(get_card(user.id, card.id, &connection), Err(Error::NotFound));
        assert_eq!(get_cards(user.id, &connection), Ok(vec![]));
        assert_eq!(
            update_card(user.id, card.id, &NewCard::for_test(), &connection),
            Err(Error::UpdateMissingCard)
        );
        assert_eq!(
            delete_card(user.id, card.id, &connection),
            Err(Error::DeleteMissingCard)
        );
    }

    #[test]
    fn active_cards_are_listed_first() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let inactive = create_card(
            user.id,
            &NewCard {
                is_active: false,
                ..NewCard::for_test()
            },
            &connection,
        )
        .unwrap();
        let active = create_card(user.id, &NewCard::for_test(), &connection).unwrap();

        let got = get_cards(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|card| card.id)
            .collect::<Vec<_>>();

        assert_eq!(got, vec![active.id, inactive.id]);
    }

    #[test]
    fn update_corrects_balance() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = create_card(user.id, &NewCard::for_test(), &connection).unwrap();

        update_card(
            user.id,
            card.id,
            &NewCard {
                balance: 1234.5,
                card_type: CardType::Credit,
                ..NewCard::for_test()
            },
            &connection,
        )
        .unwrap();

        let got = get_card(user.id, card.id, &connection).unwrap();
        assert_eq!(got.balance, 1234.5);
        assert_eq!(got.card_type, CardType::Credit);
    }

    #[test]
    fn deleting_card_keeps_transactions_as_cash() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let card = create_card(user.id, &NewCard::for_test(), &connection).unwrap();
        let transaction = create_transaction(
            user.id,
            &NewTransaction {
                type_: TransactionType::Expense,
                amount: 10.0,
                category_id: None,
                card_id: Some(card.id),
                date: date!(2025 - 03 - 01),
                description: String::new(),
            },
            &connection,
        )
        .unwrap();

        delete_card(user.id, card.id, &connection).unwrap();

        let got = get_transaction(user.id, transaction.id, &connection).unwrap();
        assert_eq!(got.card_id, None);
    }

    #[test]
    fn total_balance_sums_only_own_cards() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        for balance in [100.0, -25.5] {
            create_card(
                user.id,
                &NewCard {
                    balance,
                    ..NewCard::for_test()
                },
                &connection,
            )
            .unwrap();
        }
        create_card(
            other.id,
            &NewCard {
                balance: 1000.0,
                ..NewCard::for_test()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(get_total_balance(user.id, &connection), Ok(74.5));
        assert_eq!(get_total_balance(other.id, &connection), Ok(1000.0));
    }
}
