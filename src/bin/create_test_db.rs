use std::{error::Error, path::Path, process::exit, str::FromStr};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use budget_bloom::{
    Category, Expense, NewSavingsGoal, NewUser, PasswordHash, ValidatedPassword, YearMonth,
    create_expense, create_user, initialize_db, upsert_savings_goal,
};

/// A utility for creating a test database for the BudgetBloom API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many months of expenses to generate, ending with the current month.
    #[arg(long, default_value_t = 6)]
    months: u32,
}

/// The demo user's amount and category for each day of the month, cycled through.
const DAILY_EXPENSES: [(&str, Category); 7] = [
    ("12.50", Category::Food),
    ("4.20", Category::Transport),
    ("35.00", Category::Shopping),
    ("8.75", Category::Food),
    ("15.99", Category::Entertainment),
    ("22.40", Category::Health),
    ("6.10", Category::Other),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            email: EmailAddress::from_str("test@example.com")?,
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        OffsetDateTime::now_utc(),
        &conn,
    )?;

    println!("Creating expenses and savings goals...");

    let today = OffsetDateTime::now_utc().date();
    let first_month = YearMonth::from_date(today).months_before(args.months.saturating_sub(1));
    let mut date = first_month.first_day();
    let mut expense_count = 0;

    while date <= today {
        let (amount, category) = DAILY_EXPENSES[usize::from(date.day()) % DAILY_EXPENSES.len()];
        create_expense(
            Expense::build(user.id, Decimal::from_str(amount)?, category, date)
                .description(Some("Generated by create_test_db")),
            &conn,
        )?;
        expense_count += 1;

        let period = YearMonth::from_date(date);
        if date == period.first_day() {
            let target_amount = Decimal::from(400 + 50 * u32::from(period.month % 4));
            upsert_savings_goal(NewSavingsGoal::new(user.id, target_amount, period)?, &conn)?;
        }

        date += Duration::days(1);
    }

    println!("Created {expense_count} expenses.");
    println!("Success! Log in as test@example.com with the password 'test'.");

    Ok(())
}
