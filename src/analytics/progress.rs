//! Savings achieved against each goal over a trailing window of months.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    analytics::{AnalyticsState, checked_sum, get_month_total, percentage},
    auth::UserID,
    db::lock_connection,
    period::trailing_months,
    savings_goal::{SavingsGoal, get_savings_goals_between},
};

/// How one month went against its goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthProgress {
    /// The year of the goal.
    pub year: i32,
    /// The month of the goal (1-12).
    pub month: u8,
    /// The English month name.
    pub month_name: &'static str,
    /// The goal's spending target.
    pub target_amount: Decimal,
    /// The sum of the month's expenses.
    pub total_expenses: Decimal,
    /// `target_amount - total_expenses`.
    pub saved_amount: Decimal,
    /// `saved_amount` as a percentage of the target. Not clamped, so it is
    /// negative when the month was overspent.
    pub achievement_percentage: Decimal,
    /// Whether nothing was overspent.
    pub is_goal_met: bool,
}

impl MonthProgress {
    /// Measure a month's `total_expenses` against its goal.
    pub fn new(goal: &SavingsGoal, total_expenses: Decimal) -> Self {
        let saved_amount = goal.target_amount - total_expenses;

        Self {
            year: goal.year,
            month: goal.month,
            month_name: goal.period().name(),
            target_amount: goal.target_amount,
            total_expenses,
            saved_amount,
            achievement_percentage: percentage(saved_amount, goal.target_amount),
            is_goal_met: saved_amount >= Decimal::ZERO,
        }
    }
}

/// Averages over the months in the window that have a goal.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressAverage {
    /// The mean target.
    pub target_amount: Decimal,
    /// The mean amount saved.
    pub saved_amount: Decimal,
    /// The mean achievement percentage.
    pub achievement_rate: Decimal,
}

/// Savings progress over a window of months.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProgress {
    /// Averages over `monthly_progress`. All zero if there are no months.
    pub average: ProgressAverage,
    /// The months with a goal, oldest first.
    pub monthly_progress: Vec<MonthProgress>,
    /// The month with the highest achievement percentage.
    pub best_month: Option<MonthProgress>,
    /// The month with the lowest achievement percentage.
    pub worst_month: Option<MonthProgress>,
}

/// Summarise `monthly_progress`, which must be in chronological order.
///
/// When months tie for best or worst, the earliest of them is reported.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the months are too large to average.
pub fn savings_progress(monthly_progress: Vec<MonthProgress>) -> Result<SavingsProgress, Error> {
    let average = if monthly_progress.is_empty() {
        ProgressAverage::default()
    } else {
        let count = Decimal::from(monthly_progress.len());
        let mean = |field: fn(&MonthProgress) -> Decimal| {
            checked_sum(monthly_progress.iter().map(field)).map(|sum| sum / count)
        };

        ProgressAverage {
            target_amount: mean(|month| month.target_amount)?,
            saved_amount: mean(|month| month.saved_amount)?,
            achievement_rate: mean(|month| month.achievement_percentage)?,
        }
    };

    let mut best_month: Option<&MonthProgress> = None;
    let mut worst_month: Option<&MonthProgress> = None;

    for month in &monthly_progress {
        if best_month
            .is_none_or(|best| month.achievement_percentage > best.achievement_percentage)
        {
            best_month = Some(month);
        }

        if worst_month
            .is_none_or(|worst| month.achievement_percentage < worst.achievement_percentage)
        {
            worst_month = Some(month);
        }
    }

    Ok(SavingsProgress {
        average,
        best_month: best_month.cloned(),
        worst_month: worst_month.cloned(),
        monthly_progress,
    })
}

/// The query parameters accepted by the savings progress.
#[derive(Debug, Default, Deserialize)]
pub struct SavingsProgressQuery {
    /// How many months to look back over, including the current one.
    pub months: Option<u32>,
}

/// Get the logged in user's savings progress over recent months.
pub async fn get_savings_progress(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SavingsProgressQuery>,
) -> Result<Json<SavingsProgress>, Error> {
    let current = state.current_month()?;
    let window = trailing_months(current, query.months)?;
    let first = window.first().copied().unwrap_or(current);

    let connection = lock_connection(&state.db_connection)?;
    let goals = get_savings_goals_between(user_id, first, current, &connection)?;
    let monthly_progress = goals
        .iter()
        .map(|goal| {
            get_month_total(user_id, goal.period(), &connection)
                .map(|total_expenses| MonthProgress::new(goal, total_expenses))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    savings_progress(monthly_progress).map(Json)
}

#[cfg(test)]
mod savings_progress_tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use crate::{
        analytics::progress::{MonthProgress, ProgressAverage, savings_progress},
        endpoints,
        expense::Category,
        period::YearMonth,
        savings_goal::SavingsGoal,
        test_utils::{
            create_test_user, dec, get_test_connection, get_test_server, insert_expense,
            insert_goal, log_in_test_user,
        },
    };

    fn goal(target: &str, month: u8) -> SavingsGoal {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        insert_goal(&conn, user.id, target, 2024, month)
    }

    #[test]
    fn overspent_month_has_negative_achievement() {
        let got = MonthProgress::new(&goal("500", 5), dec("600"));

        assert_eq!(got.saved_amount, dec("-100"));
        assert_eq!(got.achievement_percentage, dec("-20"));
        assert!(!got.is_goal_met);
        assert_eq!(got.month_name, "May");
    }

    #[test]
    fn spending_exactly_the_target_meets_the_goal() {
        let got = MonthProgress::new(&goal("500", 5), dec("500"));

        assert_eq!(got.saved_amount, Decimal::ZERO);
        assert!(got.is_goal_met);
    }

    #[test]
    fn zero_target_has_zero_achievement() {
        let got = MonthProgress::new(&goal("0", 5), dec("10"));

        assert_eq!(got.achievement_percentage, Decimal::ZERO);
    }

    #[test]
    fn averages_and_extremes() {
        let months = vec![
            MonthProgress::new(&goal("100", 1), dec("50")),
            MonthProgress::new(&goal("200", 2), dec("300")),
            MonthProgress::new(&goal("100", 3), dec("50")),
            MonthProgress::new(&goal("300", 4), dec("450")),
        ];

        let got = savings_progress(months).unwrap();

        assert_eq!(
            got.average,
            ProgressAverage {
                target_amount: dec("175"),
                saved_amount: dec("-37.5"),
                achievement_rate: dec("0"),
            }
        );
        // January and March tie at 50%, February and April at -50%.
        assert_eq!(got.best_month.map(|month| month.month), Some(1));
        assert_eq!(got.worst_month.map(|month| month.month), Some(2));
    }

    #[test]
    fn empty_window() {
        let got = savings_progress(Vec::new()).unwrap();

        assert_eq!(got.average, ProgressAverage::default());
        assert!(got.monthly_progress.is_empty());
        assert_eq!(got.best_month, None);
        assert_eq!(got.worst_month, None);
    }

    #[tokio::test]
    async fn endpoint_covers_current_month() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let current = YearMonth::from_date(crate::timezone::local_today("Etc/UTC").unwrap());
        let old = current.months_before(6);
        {
            let connection = state.db_connection.lock().unwrap();
            insert_goal(&connection, user.id, "200", current.year, current.month);
            insert_goal(&connection, user.id, "200", old.year, old.month);
        }

        let response = server
            .get(endpoints::SAVINGS_PROGRESS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        let months = body["monthlyProgress"].as_array().unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0]["month"], current.month);
        assert_eq!(months[0]["achievementPercentage"], json!(100.0));
        assert_eq!(body["bestMonth"]["month"], current.month);
    }

    #[tokio::test]
    async fn endpoint_leaves_out_other_users_goals_and_expenses() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let current = YearMonth::from_date(crate::timezone::local_today("Etc/UTC").unwrap());
        {
            let connection = state.db_connection.lock().unwrap();
            let other_id = create_test_user(&connection).id;
            insert_goal(&connection, user.id, "200", current.year, current.month);
            insert_expense(&connection, user.id, "50", Category::Food, current.first_day());
            insert_goal(&connection, other_id, "1000", current.year, current.month);
            insert_expense(&connection, other_id, "150", Category::Food, current.first_day());
            let previous = current.previous();
            insert_goal(&connection, other_id, "300", previous.year, previous.month);
        }

        let response = server
            .get(endpoints::SAVINGS_PROGRESS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        let months = body["monthlyProgress"].as_array().unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0]["targetAmount"], json!(200.0));
        assert_eq!(months[0]["totalExpenses"], json!(50.0));
        assert_eq!(months[0]["savedAmount"], json!(150.0));
        assert_eq!(body["average"]["targetAmount"], json!(200.0));
    }

    #[tokio::test]
    async fn endpoint_rejects_zero_months() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .get(endpoints::SAVINGS_PROGRESS)
            .authorization_bearer(token)
            .add_query_param("months", 0)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
