//! Analytics over a user's expenses and savings goals.
//!
//! Each submodule has a pure function that does the arithmetic over records
//! already fetched from the database, and a route handler that fetches the
//! records for the logged in user. The pure functions take any "today" they
//! need as an argument so they can be tested against fixed dates.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Date;

use crate::{AppState, Error, period::YearMonth, timezone::local_today};

mod aggregation;
mod comparison;
mod distribution;
mod insights;
mod progress;
mod summary;
mod trends;

pub use aggregation::{
    Change, add_amount, checked_sum, get_month_expenses, get_month_total, percentage,
    round_percentage, sum_by_category, total_amount,
};
pub use comparison::get_category_comparison;
pub use distribution::get_category_distribution;
pub use insights::get_insights;
pub use progress::get_savings_progress;
pub use summary::get_spending_summary;
pub use trends::get_spending_trends;

/// The state needed for the analytics handlers.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading expenses and goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl AnalyticsState {
    /// Today's date in the server's timezone.
    pub fn today(&self) -> Result<Date, Error> {
        local_today(&self.local_timezone)
    }

    /// The current month in the server's timezone.
    pub fn current_month(&self) -> Result<YearMonth, Error> {
        self.today().map(YearMonth::from_date)
    }
}
