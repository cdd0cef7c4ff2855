//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, user::profile::create_default_user_profile};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's personal details.
    pub details: UserDetails,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

impl User {
    /// The name to greet the user with, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.details.first_name.is_empty() {
            &self.details.username
        } else {
            &self.details.first_name
        }
    }
}

/// The personal details a user enters at registration and can change on the profile page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserDetails {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub passport_number: Option<String>,
    /// The taxpayer identification number.
    pub inn: Option<String>,
}

impl UserDetails {
    /// Trim every field, turn blank optional fields into `None` and check
    /// the username and e-mail address.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyUsername] for a blank username and
    /// [Error::InvalidEmail] if the e-mail address cannot be parsed.
    pub fn validated(self) -> Result<Self, Error> {
        let username = self.username.trim().to_owned();
        if username.is_empty() {
            return Err(Error::EmptyUsername);
        }

        let email = self.email.trim();
        if !EmailAddress::is_valid(email) {
            return Err(Error::InvalidEmail(email.to_owned()));
        }

        Ok(Self {
            username,
            email: email.to_owned(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            phone_number: non_blank(self.phone_number),
            address: non_blank(self.address),
            passport_number: non_blank(self.passport_number),
            inn: non_blank(self.inn),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                phone_number TEXT,
                address TEXT,
                passport_number TEXT,
                inn TEXT,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new user and their default profile into the database.
///
/// `details` should have been checked with [UserDetails::validated].
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if another user
///   already registered with the same username or e-mail,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    details: UserDetails,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let transaction = connection.unchecked_transaction()?;
    let created_at = OffsetDateTime::now_utc();

    let id = transaction.query_row(
        "INSERT INTO user (username, email, first_name, last_name, phone_number, address,
            passport_number, inn, password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING id",
        (
            &details.username,
            &details.email,
            &details.first_name,
            &details.last_name,
            &details.phone_number,
            &details.address,
            &details.passport_number,
            &details.inn,
            password_hash.to_string(),
            created_at,
        ),
        |row| row.get(0).map(UserID::new),
    )?;

    create_default_user_profile(id, &transaction)?;
    transaction.commit()?;

    Ok(User {
        id,
        details,
        password_hash,
        created_at,
    })
}

const SELECT_USER: &str = "SELECT id, username, email, first_name, last_name, phone_number,
    address, passport_number, inn, password, created_at FROM user";

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user whose username or e-mail address equals `login`.
///
/// E-mail addresses are compared case-insensitively.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user matches `login`.
pub fn get_user_by_login(login: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "{SELECT_USER} WHERE username = ?1 OR email = ?1"
        ))?
        .query_row((login.trim(),), map_user_row)
        .map_err(|error| error.into())
}

/// Overwrite the personal details of the user `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::UpdateMissingUser] if the user does not exist,
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if the new
///   username or e-mail belong to another user.
pub fn update_user_details(
    user_id: UserID,
    details: &UserDetails,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET username = ?1, email = ?2, first_name = ?3, last_name = ?4,
            phone_number = ?5, address = ?6, passport_number = ?7, inn = ?8
         WHERE id = ?9",
        (
            &details.username,
            &details.email,
            &details.first_name,
            &details.last_name,
            &details.phone_number,
            &details.address,
            &details.passport_number,
            &details.inn,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|count| usize::try_from(count).unwrap_or_default())
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(9)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        details: UserDetails {
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            phone_number: row.get(5)?,
            address: row.get(6)?,
            passport_number: row.get(7)?,
            inn: row.get(8)?,
        },
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(10)?,
    })
}
