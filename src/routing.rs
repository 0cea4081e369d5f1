//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    AppState, Error,
    analytics::{
        get_category_comparison, get_category_distribution, get_insights, get_savings_progress,
        get_spending_summary, get_spending_trends,
    },
    auth::{
        auth_guard, change_password, get_current_user, post_log_in, post_log_out, register_user,
        request_password_reset, update_profile,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_expense_calendar, get_expense_endpoint, get_monthly_summary, list_expenses_endpoint,
    },
    savings_goal::{
        delete_savings_goal_endpoint, get_current_goal_endpoint, get_goal_for_month_endpoint,
        get_goal_nudges_endpoint, get_goal_progress_endpoint, list_savings_goals_endpoint,
        set_savings_goal_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::FORGOT_PASSWORD, post(request_password_reset));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(endpoints::PROFILE, patch(update_profile))
        .route(endpoints::CHANGE_PASSWORD, post(change_password))
        .route(
            endpoints::EXPENSES,
            post(create_expense_endpoint).get(list_expenses_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(edit_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(endpoints::EXPENSE_CALENDAR, get(get_expense_calendar))
        .route(endpoints::EXPENSE_MONTHLY_SUMMARY, get(get_monthly_summary))
        .route(
            endpoints::GOALS,
            post(set_savings_goal_endpoint).get(list_savings_goals_endpoint),
        )
        .route(endpoints::CURRENT_GOAL, get(get_current_goal_endpoint))
        .route(endpoints::GOAL_PROGRESS, get(get_goal_progress_endpoint))
        .route(endpoints::GOAL_NUDGES, get(get_goal_nudges_endpoint))
        .route(endpoints::GOAL_FOR_MONTH, get(get_goal_for_month_endpoint))
        .route(endpoints::GOAL, delete(delete_savings_goal_endpoint))
        .route(
            endpoints::CATEGORY_DISTRIBUTION,
            get(get_category_distribution),
        )
        .route(endpoints::SPENDING_TRENDS, get(get_spending_trends))
        .route(endpoints::CATEGORY_COMPARISON, get(get_category_comparison))
        .route(endpoints::SAVINGS_PROGRESS, get(get_savings_progress))
        .route(endpoints::INSIGHTS, get(get_insights))
        .route(endpoints::SPENDING_SUMMARY, get(get_spending_summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Build the CORS layer for the browser clients served from `allowed_origins`.
///
/// Credentials are allowed, so origins must be listed explicitly. Origins
/// that are not valid header values are skipped with a warning.
pub fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin \"{origin}\".");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
