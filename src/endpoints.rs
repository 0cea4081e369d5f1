//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route for getting the logged in user.
pub const CURRENT_USER: &str = "/api/auth/me";
/// The route for updating the logged in user's name.
pub const PROFILE: &str = "/api/auth/profile";
/// The route for changing the logged in user's password.
pub const CHANGE_PASSWORD: &str = "/api/auth/change-password";
/// The route for requesting a password reset.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";

/// The route to create and list expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to get, update and delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for a month of expenses grouped by day.
pub const EXPENSE_CALENDAR: &str = "/api/expenses/calendar/{year}/{month}";
/// The route for a month's expense totals by category.
pub const EXPENSE_MONTHLY_SUMMARY: &str = "/api/expenses/summary/{year}/{month}";

/// The route to create/update and list savings goals.
pub const GOALS: &str = "/api/goals";
/// The route for the current month's savings goal.
pub const CURRENT_GOAL: &str = "/api/goals/current";
/// The route for the savings goal progress overview.
pub const GOAL_PROGRESS: &str = "/api/goals/progress";
/// The route for savings goal encouragement nudges.
pub const GOAL_NUDGES: &str = "/api/goals/nudges";
/// The route for the savings goal of a specific month.
pub const GOAL_FOR_MONTH: &str = "/api/goals/{year}/{month}";
/// The route to delete a savings goal.
pub const GOAL: &str = "/api/goals/{goal_id}";

/// The route for spending per category.
pub const CATEGORY_DISTRIBUTION: &str = "/api/analytics/category-distribution";
/// The route for spending over time.
pub const SPENDING_TRENDS: &str = "/api/analytics/spending-trends";
/// The route for comparing spending between two periods.
pub const CATEGORY_COMPARISON: &str = "/api/analytics/category-comparison";
/// The route for savings goal achievement over several months.
pub const SAVINGS_PROGRESS: &str = "/api/analytics/savings-progress";
/// The route for generated financial insights.
pub const INSIGHTS: &str = "/api/analytics/insights";
/// The route for the current vs. previous month spending summary.
pub const SPENDING_SUMMARY: &str = "/api/analytics/summary";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// For example, in the endpoint path '/api/expenses/{expense_id}', '{expense_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    match endpoint_path.split_once('{') {
        Some((head, rest)) => match rest.split_once('}') {
            Some((_, tail)) => format!("{head}{id}{tail}"),
            None => format!("{head}{id}"),
        },
        None => endpoint_path.to_owned(),
    }
}
