//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing, could not be decoded or has expired.
    #[error("no valid auth cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty (or whitespace only) username was given.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The string is not a valid e-mail address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// Another user already has this username.
    #[error("that username is already taken")]
    DuplicateUsername,

    /// Another user already registered this e-mail address.
    #[error("that email address is already registered")]
    DuplicateEmail,

    /// The string is not one of the supported currency codes.
    #[error("\"{0}\" is not a supported currency")]
    InvalidCurrency(String),

    /// The monthly budget in a profile must not be negative.
    #[error("the monthly budget {0} cannot be negative")]
    NegativeMonthlyBudget(f64),

    /// A card number did not have between 12 and 19 digits.
    #[error("a card number must have between 12 and 19 digits")]
    InvalidCardNumber,

    /// An empty card holder name was given.
    #[error("Card holder cannot be empty")]
    EmptyCardHolder,

    /// A card balance was infinite or not a number.
    #[error("the balance {0} is not a valid amount")]
    InvalidCardBalance(f64),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The colour is not a hex colour of the form "#rrggbb".
    #[error("\"{0}\" is not a colour of the form #rrggbb")]
    InvalidColor(String),

    /// The user already has a category with this name and type.
    #[error("a category with that name and type already exists")]
    DuplicateCategoryName,

    /// The category does not exist, belongs to another user or is inactive.
    #[error("the category does not refer to one of your active categories")]
    InvalidCategory,

    /// The category's type does not match the transaction or budget.
    #[error("the category type does not match the transaction type")]
    CategoryTypeMismatch,

    /// The card does not exist or belongs to another user.
    #[error("the card does not refer to one of your cards")]
    InvalidCard,

    /// Amounts on transactions and budgets must be greater than zero.
    #[error("the amount {0} must be greater than zero")]
    NonPositiveAmount(f64),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A budget month was not of the form "YYYY-MM".
    #[error("\"{0}\" is not a month of the form YYYY-MM")]
    InvalidBudgetMonth(String),

    /// The user already has a budget for the category in that month.
    #[error("a budget for that category and month already exists")]
    DuplicateBudget,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a user that does not exist
    #[error("tried to update a user that is not in the database")]
    UpdateMissingUser,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a card that does not exist
    #[error("tried to delete a card that is not in the database")]
    DeleteMissingCard,

    /// Tried to update a card that does not exist
    #[error("tried to update a card that is not in the database")]
    UpdateMissingCard,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.type") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("budget.month") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. \
                        Change the date to today or earlier."
                    ),
                },
            ),
            Error::InvalidCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: "Choose one of your active categories.".to_owned(),
                },
            ),
            Error::CategoryTypeMismatch => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: "The category must have the same type (income or expense) \
                        as the transaction."
                        .to_owned(),
                },
            ),
            Error::InvalidCard => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid card".to_owned(),
                    details: "Choose one of your cards, or pay with cash.".to_owned(),
                },
            ),
            Error::NonPositiveAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("The amount must be greater than zero, got {amount}."),
                },
            ),
            Error::DuplicateCategoryName => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate category".to_owned(),
                    details: "You already have a category with that name and type. \
                        Choose a different name, or edit the existing category."
                        .to_owned(),
                },
            ),
            Error::DuplicateBudget => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate budget".to_owned(),
                    details: "There is already a budget for that category and month. \
                        Edit the existing budget instead."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCard => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update card".to_owned(),
                    details: "The card could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCard => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete card".to_owned(),
                    details: "The card could not be found. \
                    Try refreshing the page to see if the card has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update budget".to_owned(),
                    details: "The budget could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete budget".to_owned(),
                    details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingUser => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update profile".to_owned(),
                    details: "Your account could not be found. Try logging in again.".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
