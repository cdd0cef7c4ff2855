use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use kopilka::{PasswordHash, UserDetails, ValidatedPassword, create_user, initialize_db};

/// A utility for creating a database with demo data for trying out the Kopilka server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Expense and income categories as (name, type, icon, colour).
const CATEGORIES: [(&str, &str, &str, &str); 5] = [
    ("Food", "expense", "food", "#f97316"),
    ("Transport", "expense", "transport", "#3b82f6"),
    ("Home", "expense", "home", "#a855f7"),
    ("Entertainment", "expense", "entertainment", "#ec4899"),
    ("Salary", "income", "salary", "#22c55e"),
];

/// Transactions as (days ago, type, amount, category index, card index, description).
const TRANSACTIONS: [(i64, &str, f64, Option<usize>, Option<usize>, &str); 12] = [
    (45, "income", 85_000.0, Some(4), Some(0), "Salary"),
    (40, "expense", 2_350.5, Some(0), Some(0), "Groceries"),
    (33, "expense", 25_000.0, Some(2), Some(0), "Rent"),
    (28, "expense", 1_200.0, Some(1), Some(1), "Taxi"),
    (20, "income", 85_000.0, Some(4), Some(0), "Salary"),
    (15, "expense", 3_100.0, Some(0), Some(0), "Groceries"),
    (10, "expense", 800.0, Some(3), Some(1), "Cinema"),
    (6, "expense", 25_000.0, Some(2), Some(0), "Rent"),
    (4, "expense", 450.0, Some(1), None, "Bus pass top up"),
    (3, "expense", 1_750.0, Some(0), Some(1), "Restaurant"),
    (1, "expense", 390.0, None, None, "Coffee"),
    (0, "expense", 2_600.0, Some(0), Some(0), "Groceries"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        UserDetails {
            username: "demo".to_owned(),
            email: "demo@example.com".to_owned(),
            first_name: "Ivan".to_owned(),
            last_name: "Petrov".to_owned(),
            phone_number: None,
            address: None,
            passport_number: None,
            inn: None,
        },
        password_hash,
        &conn,
    )?;
    let user_id = user.id.as_i64();
    let now = OffsetDateTime::now_utc();
    let today = now.date();

    println!("Creating categories...");

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, type_, icon, color) in CATEGORIES {
        let id: i64 = conn.query_row(
            "INSERT INTO category (user_id, name, type, icon, color) VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id",
            (user_id, name, type_, icon, color),
            |row| row.get(0),
        )?;
        category_ids.push(id);
    }

    println!("Creating cards...");

    // Card balances start from these amounts and then follow the transactions.
    let mut card_balances = [10_000.0, 0.0];
    for (_, type_, amount, _, card, _) in TRANSACTIONS {
        if let Some(card) = card {
            card_balances[card] += if type_ == "income" { amount } else { -amount };
        }
    }

    let mut card_ids = Vec::with_capacity(card_balances.len());
    for ((last_four, system, card_type), balance) in [
        ("4242", "visa", "debit"),
        ("2200", "mir", "credit"),
    ]
    .into_iter()
    .zip(card_balances)
    {
        let id: i64 = conn.query_row(
            "INSERT INTO card (user_id, card_holder, last_four, card_system, card_type, balance,
                is_active, created_at)
             VALUES (?1, 'IVAN PETROV', ?2, ?3, ?4, ?5, 1, ?6)
             RETURNING id",
            (user_id, last_four, system, card_type, balance, now),
            |row| row.get(0),
        )?;
        card_ids.push(id);
    }

    println!("Creating transactions...");

    for (days_ago, type_, amount, category, card, description) in TRANSACTIONS {
        conn.execute(
            "INSERT INTO \"transaction\"
                (user_id, type, amount, category_id, card_id, date, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                user_id,
                type_,
                amount,
                category.map(|index| category_ids[index]),
                card.map(|index| card_ids[index]),
                today - Duration::days(days_ago),
                description,
                now,
            ),
        )?;
    }

    println!("Success! Log in as \"demo\" with the password \"test\".");

    Ok(())
}
