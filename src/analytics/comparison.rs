//! Category spending compared between two months or two years.

use std::{collections::BTreeMap, str::FromStr};

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    analytics::{AnalyticsState, Change, checked_sum, sum_by_category},
    auth::UserID,
    db::lock_connection,
    expense::{Category, ExpenseFilter, get_expenses},
    period::YearMonth,
};

/// How the compared periods are specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareType {
    /// Periods are months formatted as "YYYY-MM".
    MonthToMonth,
    /// Periods are years formatted as "YYYY".
    YearToYear,
}

impl FromStr for CompareType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month-to-month" => Ok(CompareType::MonthToMonth),
            "year-to-year" => Ok(CompareType::YearToYear),
            other => Err(Error::Validation(format!(
                "compareType must be month-to-month or year-to-year, got \"{other}\""
            ))),
        }
    }
}

impl CompareType {
    /// Parse a period identifier into the filter selecting its expenses.
    fn parse_period(&self, raw: &str) -> Result<ExpenseFilter, Error> {
        let invalid = || {
            let format = match self {
                CompareType::MonthToMonth => "YYYY-MM",
                CompareType::YearToYear => "YYYY",
            };
            Error::Validation(format!("period must be formatted as {format}, got \"{raw}\""))
        };

        match self {
            CompareType::MonthToMonth => {
                let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
                let year = year.parse().map_err(|_| invalid())?;
                let month = month.parse().map_err(|_| invalid())?;

                YearMonth::new(year, month).map(ExpenseFilter::for_month)
            }
            CompareType::YearToYear => raw
                .parse()
                .map(ExpenseFilter::for_year)
                .map_err(|_| invalid()),
        }
    }
}

/// The spending in one of the compared periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSpending {
    /// The period identifier as given.
    pub period: String,
    /// The sum of the period's expenses.
    pub total: Decimal,
    /// The sum for each category with spending in the period.
    pub categories: BTreeMap<Category, Decimal>,
}

impl PeriodSpending {
    fn new(period: &str, categories: BTreeMap<Category, Decimal>) -> Result<Self, Error> {
        Ok(Self {
            period: period.to_owned(),
            total: checked_sum(categories.values().copied())?,
            categories,
        })
    }
}

/// The differences between the compared periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingChanges {
    /// The change in total spending.
    pub total: Change,
    /// The change for each category with spending in either period.
    pub categories: BTreeMap<Category, Change>,
}

/// Category spending in two periods and the changes between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    /// The later period.
    pub current: PeriodSpending,
    /// The earlier period.
    pub previous: PeriodSpending,
    /// `current - previous`.
    pub changes: SpendingChanges,
}

/// Compare the per-category spending of two periods.
///
/// A category missing from one period counts as zero in that period.
pub fn compare_categories(current: PeriodSpending, previous: PeriodSpending) -> CategoryComparison {
    let categories = current
        .categories
        .keys()
        .chain(previous.categories.keys())
        .map(|category| {
            let current_amount = current.categories.get(category).copied().unwrap_or_default();
            let previous_amount = previous.categories.get(category).copied().unwrap_or_default();

            (*category, Change::between(current_amount, previous_amount))
        })
        .collect();

    let changes = SpendingChanges {
        total: Change::between(current.total, previous.total),
        categories,
    };

    CategoryComparison {
        current,
        previous,
        changes,
    }
}

/// The query parameters accepted by the category comparison.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonQuery {
    /// "month-to-month" or "year-to-year".
    pub compare_type: Option<String>,
    /// The later period.
    pub current: Option<String>,
    /// The earlier period.
    pub previous: Option<String>,
}

fn get_period_spending(
    user_id: UserID,
    period: &str,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<PeriodSpending, Error> {
    let expenses = get_expenses(user_id, filter, connection)?;

    PeriodSpending::new(period, sum_by_category(&expenses)?)
}

/// Compare the logged in user's category spending between two periods.
pub async fn get_category_comparison(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<CategoryComparison>, Error> {
    let non_empty = |value: &Option<String>| value.clone().filter(|value| !value.trim().is_empty());
    let (Some(compare_type), Some(current), Some(previous)) = (
        non_empty(&query.compare_type),
        non_empty(&query.current),
        non_empty(&query.previous),
    ) else {
        return Err(Error::Validation("Missing required parameters".to_owned()));
    };

    let compare_type = CompareType::from_str(&compare_type)?;
    let current_filter = compare_type.parse_period(&current)?;
    let previous_filter = compare_type.parse_period(&previous)?;

    // Both periods are read under one lock so they see the same data.
    let connection = lock_connection(&state.db_connection)?;
    let current = get_period_spending(user_id, &current, &current_filter, &connection)?;
    let previous = get_period_spending(user_id, &previous, &previous_filter, &connection)?;

    Ok(Json(compare_categories(current, previous)))
}

#[cfg(test)]
mod category_comparison_tests {
    use std::collections::BTreeMap;

    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        analytics::{
            Change,
            comparison::{CompareType, PeriodSpending, compare_categories},
        },
        endpoints,
        expense::{Category, ExpenseFilter},
        period::YearMonth,
        test_utils::{create_test_user, dec, get_test_server, insert_expense, log_in_test_user},
    };

    #[test]
    fn parses_month_and_year_periods() {
        assert_eq!(
            CompareType::MonthToMonth.parse_period("2024-05"),
            Ok(ExpenseFilter::for_month(YearMonth::new(2024, 5).unwrap()))
        );
        assert_eq!(
            CompareType::YearToYear.parse_period("2023"),
            Ok(ExpenseFilter::for_year(2023))
        );
        assert!(matches!(
            CompareType::MonthToMonth.parse_period("2024"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            CompareType::MonthToMonth.parse_period("2024-13"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            CompareType::YearToYear.parse_period("last year"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn deltas_are_current_minus_previous() {
        let current = PeriodSpending::new(
            "2024-05",
            BTreeMap::from([(Category::Food, dec("150")), (Category::Health, dec("40"))]),
        )
        .unwrap();
        let previous = PeriodSpending::new(
            "2024-04",
            BTreeMap::from([(Category::Food, dec("100")), (Category::Transport, dec("60"))]),
        )
        .unwrap();

        let got = compare_categories(current, previous);

        assert_eq!(got.current.total, dec("190"));
        assert_eq!(got.previous.total, dec("160"));
        assert_eq!(got.changes.total.amount, dec("30"));
        assert_eq!(
            got.changes.categories,
            BTreeMap::from([
                (
                    Category::Food,
                    Change {
                        amount: dec("50"),
                        percentage: dec("50"),
                    }
                ),
                (
                    Category::Transport,
                    Change {
                        amount: dec("-60"),
                        percentage: dec("-100"),
                    }
                ),
                (
                    Category::Health,
                    Change {
                        amount: dec("40"),
                        percentage: Decimal::ZERO,
                    }
                ),
            ])
        );
    }

    #[tokio::test]
    async fn missing_parameter_is_rejected() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .get(endpoints::CATEGORY_COMPARISON)
            .authorization_bearer(token)
            .add_query_param("compareType", "month-to-month")
            .add_query_param("current", "2024-05")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Missing required parameters" }));
    }

    #[tokio::test]
    async fn compares_years() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        {
            let connection = state.db_connection.lock().unwrap();
            insert_expense(&connection, user.id, "30", Category::Food, date!(2024 - 02 - 01));
            insert_expense(&connection, user.id, "20", Category::Food, date!(2023 - 07 - 01));
        }

        let response = server
            .get(endpoints::CATEGORY_COMPARISON)
            .authorization_bearer(token)
            .add_query_param("compareType", "year-to-year")
            .add_query_param("current", "2024")
            .add_query_param("previous", "2023")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "current": { "period": "2024", "total": 30.0, "categories": { "Food": 30.0 } },
            "previous": { "period": "2023", "total": 20.0, "categories": { "Food": 20.0 } },
            "changes": {
                "total": { "amount": 10.0, "percentage": 50.0 },
                "categories": { "Food": { "amount": 10.0, "percentage": 50.0 } }
            }
        }));
    }

    #[tokio::test]
    async fn endpoint_leaves_out_other_users_expenses() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        {
            let connection = state.db_connection.lock().unwrap();
            let other_id = create_test_user(&connection).id;
            insert_expense(&connection, user.id, "40", Category::Food, date!(2024 - 05 - 02));
            insert_expense(&connection, user.id, "20", Category::Food, date!(2024 - 04 - 02));
            insert_expense(&connection, other_id, "300", Category::Food, date!(2024 - 05 - 02));
            insert_expense(&connection, other_id, "90", Category::Health, date!(2024 - 04 - 02));
        }

        let response = server
            .get(endpoints::CATEGORY_COMPARISON)
            .authorization_bearer(token)
            .add_query_param("compareType", "month-to-month")
            .add_query_param("current", "2024-05")
            .add_query_param("previous", "2024-04")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "current": { "period": "2024-05", "total": 40.0, "categories": { "Food": 40.0 } },
            "previous": { "period": "2024-04", "total": 20.0, "categories": { "Food": 20.0 } },
            "changes": {
                "total": { "amount": 20.0, "percentage": 100.0 },
                "categories": { "Food": { "amount": 20.0, "percentage": 100.0 } }
            }
        }));
    }
}
