//! The per-user preferences stored next to the user's account.

use rusqlite::{Connection, Row};

use crate::{Error, currency::Currency, user::UserID};

/// A user's preferences, one per user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserID,
    /// The total the user plans to spend each month, zero when not set.
    pub monthly_budget: f64,
    /// The currency amounts are displayed in.
    pub currency: Currency,
    pub notification_enabled: bool,
    /// Stored only, no e-mails are sent.
    pub email_notifications: bool,
    /// Whether the dashboard shows spending recommendations.
    pub ai_recommendations_enabled: bool,
}

impl UserProfile {
    /// The profile given to a newly registered user.
    pub fn default_for(user_id: UserID) -> Self {
        Self {
            user_id,
            monthly_budget: 0.0,
            currency: Currency::default(),
            notification_enabled: true,
            email_notifications: false,
            ai_recommendations_enabled: true,
        }
    }
}

pub fn create_user_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_profile (
                user_id INTEGER PRIMARY KEY,
                monthly_budget REAL NOT NULL DEFAULT 0,
                currency TEXT NOT NULL DEFAULT 'RUB',
                notification_enabled INTEGER NOT NULL DEFAULT 1,
                email_notifications INTEGER NOT NULL DEFAULT 0,
                ai_recommendations_enabled INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default profile for `user_id`, leaving an existing profile as is.
pub(super) fn create_default_user_profile(
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO user_profile (user_id) VALUES (?1)",
        (user_id.as_i64(),),
    )?;

    Ok(())
}

/// Get the profile of `user_id`.
///
/// Users without a stored profile get [UserProfile::default_for].
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_profile(user_id: UserID, connection: &Connection) -> Result<UserProfile, Error> {
    let result = connection
        .prepare(
            "SELECT user_id, monthly_budget, currency, notification_enabled,
                email_notifications, ai_recommendations_enabled
             FROM user_profile WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_profile_row)
        .map_err(Error::from);

    match result {
        Err(Error::NotFound) => Ok(UserProfile::default_for(user_id)),
        result => result,
    }
}

/// Save `profile`, creating the row if the user does not have one yet.
///
/// # Errors
///
/// Returns [Error::NegativeMonthlyBudget] if the monthly budget is negative
/// or not a number.
pub fn update_user_profile(profile: &UserProfile, connection: &Connection) -> Result<(), Error> {
    if !profile.monthly_budget.is_finite() || profile.monthly_budget < 0.0 {
        return Err(Error::NegativeMonthlyBudget(profile.monthly_budget));
    }

    connection.execute(
        "INSERT INTO user_profile (user_id, monthly_budget, currency, notification_enabled,
            email_notifications, ai_recommendations_enabled)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
            monthly_budget = excluded.monthly_budget,
            currency = excluded.currency,
            notification_enabled = excluded.notification_enabled,
            email_notifications = excluded.email_notifications,
            ai_recommendations_enabled = excluded.ai_recommendations_enabled",
        (
            profile.user_id.as_i64(),
            profile.monthly_budget,
            profile.currency,
            profile.notification_enabled,
            profile.email_notifications,
            profile.ai_recommendations_enabled,
        ),
    )?;

    Ok(())
}

fn map_profile_row(row: &Row) -> Result<UserProfile, rusqlite::Error> {
    Ok(UserProfile {
        user_id: UserID::new(row.get(0)?),
        monthly_budget: row.get(1)?,
        currency: row.get(2)?,
        notification_enabled: row.get(3)?,
        email_notifications: row.get(4)?,
        ai_recommendations_enabled: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        currency::Currency,
        test_utils::{create_test_user, get_test_connection},
        user::{UserID, UserProfile, get_user_profile, update_user_profile},
    };

    #[test]
    fn missing_profile_falls_back_to_default() {
        let connection = get_test_connection();

        let got = get_user_profile(UserID::new(99), &connection).unwrap();

        assert_eq!(got, UserProfile::default_for(UserID::new(99)));
    }

    #[test]
    fn update_profile_round_trips() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let want = UserProfile {
            user_id: user.id,
            monthly_budget: 50_000.0,
            currency: Currency::Eur,
            notification_enabled: false,
            email_notifications: true,
            ai_recommendations_enabled: false,
        };

        update_user_profile(&want, &connection).unwrap();

        assert_eq!(get_user_profile(user.id, &connection), Ok(want));
    }

    #[test]
    fn update_profile_rejects_negative_budget() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let profile = UserProfile {
            monthly_budget: -1.0,
            ..UserProfile::default_for(user.id)
        };

        let result = update_user_profile(&profile, &connection);

        assert_eq!(result, Err(Error::NegativeMonthlyBudget(-1.0)));
        assert_eq!(get_user_profile(user.id, &connection).unwrap().monthly_budget, 0.0);
    }
}
