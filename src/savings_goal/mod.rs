//! Monthly savings goals: how much a user means to spend at most in a month.

mod db;
mod delete;
mod domain;
mod list;
mod nudges;
mod progress;
mod upsert;

pub use db::{
    GoalSortField, GoalUpsert, create_savings_goal_table, delete_savings_goal,
    get_savings_goal_for_month, get_savings_goals_between, list_savings_goals,
    upsert_savings_goal,
};
pub use delete::delete_savings_goal_endpoint;
pub use domain::{GoalStatus, GoalWithStatus, NewSavingsGoal, SavingsGoal, SavingsGoalId};
pub use list::{
    get_current_goal_endpoint, get_goal_for_month_endpoint, list_savings_goals_endpoint,
};
pub use nudges::get_goal_nudges_endpoint;
pub use progress::get_goal_progress_endpoint;
pub use upsert::set_savings_goal_endpoint;
