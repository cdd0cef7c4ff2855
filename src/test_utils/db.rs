use rusqlite::Connection;

use crate::{
    PasswordHash,
    db::initialize,
    user::{User, UserDetails, create_user},
};

/// An in-memory database with the full schema.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize test database");

    connection
}

/// Insert a user named `username` with a throwaway password hash.
pub(crate) fn create_test_user_named(username: &str, connection: &Connection) -> User {
    create_user(
        UserDetails {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            ..Default::default()
        },
        PasswordHash::new_unchecked("not-a-real-hash"),
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn create_test_user(connection: &Connection) -> User {
    create_test_user_named("test_user", connection)
}
