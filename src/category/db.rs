//! Database operations for categories.

use std::collections::HashMap;

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryColor, CategoryId, CategoryName, NewCategory},
    transaction::TransactionType,
    user::UserID,
};

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if the user already has a category
/// with the same name and type.
pub fn create_category(
    user_id: UserID,
    category: &NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let id = connection.query_row(
        "INSERT INTO category (user_id, name, type, icon, color, description, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id",
        (
            user_id.as_i64(),
            category.name.as_ref(),
            category.type_,
            category.icon,
            category.color.as_ref(),
            &category.description,
            category.is_active,
        ),
        |row| row.get(0),
    )?;

    Ok(Category {
        id,
        user_id,
        name: category.name.clone(),
        type_: category.type_,
        icon: category.icon,
        color: category.color.clone(),
        description: category.description.clone(),
        is_active: category.is_active,
    })
}

const SELECT_CATEGORY: &str =
    "SELECT id, user_id, name, type, icon, color, description, is_active FROM category";

/// Retrieve one of the user's categories.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!("{SELECT_CATEGORY} WHERE id = ?1 AND user_id = ?2"))?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories, expense categories first and then by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CATEGORY} WHERE user_id = ?1 ORDER BY type ASC, name ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's active categories, optionally only those of one type.
pub fn get_active_categories(
    user_id: UserID,
    type_: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CATEGORY}
             WHERE user_id = ?1 AND is_active = 1 AND (?2 IS NULL OR type = ?2)
             ORDER BY type ASC, name ASC"
        ))?
        .query_map((user_id.as_i64(), type_), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Overwrite one of the user's categories.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the user has no such category.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    category: &NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category
         SET name = ?1, type = ?2, icon = ?3, color = ?4, description = ?5, is_active = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            category.name.as_ref(),
            category.type_,
            category.icon,
            category.color.as_ref(),
            &category.description,
            category.is_active,
            category_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

#[cfg(test)]
pub fn set_category_active(
    user_id: UserID,
    category_id: CategoryId,
    is_active: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET is_active = ?1 WHERE id = ?2 AND user_id = ?3",
        (is_active, category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete one of the user's categories.
///
/// Its transactions become uncategorised and its budgets are deleted.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCategory] if the user has no such category.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Count how many of the user's transactions use each category.
///
/// Categories without transactions are not in the map.
pub fn count_transactions_per_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM \"transaction\"
             WHERE user_id = ?1 AND category_id IS NOT NULL
             GROUP BY category_id",
        )?
        .query_map([user_id.as_i64()], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();

    result.map_err(Error::from)
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE(user_id, name, type)
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let raw_color: String = row.get(5)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        type_: row.get(3)?,
        icon: row.get(4)?,
        color: CategoryColor::new_unchecked(&raw_color),
        description: row.get(6)?,
        is_active: row.get(7)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        budget::{NewBudget, create_budget, get_budget},
        category::{
            CategoryName, NewCategory, count_transactions_per_category, create_category,
            delete_category, get_active_categories, get_categories, get_category,
            set_category_active, update_category,
        },
        test_utils::{create_test_user, create_test_user_named, get_test_connection},
        transaction::{NewTransaction, TransactionType, create_transaction, get_transaction},
    };

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let new_category = NewCategory::for_test("Groceries", TransactionType::Expense);

        let category = create_category(user.id, &new_category, &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, new_category.name);
        assert_eq!(get_category(user.id, category.id, &connection), Ok(category));
    }

    #[test]
    fn same_name_is_allowed_for_different_types() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        create_category(
            user.id,
            &NewCategory::for_test("Other", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        let result = create_category(
            user.id,
            &NewCategory::for_test("Other", TransactionType::Income),
            &connection,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_name_and_type_fails() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let new_category = NewCategory::for_test("Groceries", TransactionType::Expense);
        create_category(user.id, &new_category, &connection).unwrap();

        let result = create_category(user.id, &new_category, &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn users_do_not_see_each_others_categories() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other = create_test_user_named("other", &connection);
        let category = create_category(
            other.id,
            &NewCategory::for_test("Groceries", TransactionType::Expense),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_category(user.id, category.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_categories(user.id, &connection), Ok(vec![]));
        assert_eq!(
            delete_category(user.id, category.id, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn active_categories_filter_by_type_and_status() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        let taxi = create_category(
            user.id,
            &NewCategory::for_test("Taxi", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        create_category(
            user.id,
            &NewCategory::for_test("Salary", TransactionType::Income),
            &connection,
        )
        .unwrap();
        set_category_active(user.id, taxi.id, false, &connection).unwrap();

        let got =
            get_active_categories(user.id, Some(TransactionType::Expense), &connection).unwrap();

        assert_eq!(got, vec![food]);
        assert_eq!(
            get_active_categories(user.id, None, &connection)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        let update = NewCategory {
            name: CategoryName::new_unchecked("Eating out"),
            is_active: false,
            ..NewCategory::for_test("", TransactionType::Expense)
        };

        update_category(user.id, category.id, &update, &connection).unwrap();

        let got = get_category(user.id, category.id, &connection).unwrap();
        assert_eq!(got.name.as_ref(), "Eating out");
        assert!(!got.is_active);
    }

    #[test]
    fn update_missing_category_fails() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        let result = update_category(
            user.id,
            999,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_leaves_transactions_uncategorised_and_removes_budgets() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            user.id,
            &NewTransaction {
                type_: TransactionType::Expense,
                amount: 10.0,
                category_id: Some(food.id),
                card_id: None,
                date: date!(2025 - 03 - 01),
                description: String::new(),
            },
            &connection,
        )
        .unwrap();
        let budget = create_budget(
            user.id,
            &NewBudget {
                category_id: food.id,
                amount: 100.0,
                month: date!(2025 - 03 - 01),
            },
            &connection,
        )
        .unwrap();

        delete_category(user.id, food.id, &connection).unwrap();

        let transaction = get_transaction(user.id, transaction.id, &connection).unwrap();
        assert_eq!(transaction.category_id, None);
        assert_eq!(
            get_budget(user.id, budget.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn counts_transactions_per_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            user.id,
            &NewCategory::for_test("Food", TransactionType::Expense),
            &connection,
        )
        .unwrap();
        for category_id in [Some(food.id), Some(food.id), None] {
            create_transaction(
                user.id,
                &NewTransaction {
                    type_: TransactionType::Expense,
                    amount: 10.0,
                    category_id,
                    card_id: None,
                    date: date!(2025 - 03 - 01),
                    description: String::new(),
                },
                &connection,
            )
            .unwrap();
        }

        let counts = count_transactions_per_category(user.id, &connection).unwrap();

        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&food.id], 2);
    }
}
