//! Authentication middleware that validates bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{TokenKeys, decode_token, get_user_by_id},
    db::lock_connection,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The keys used to verify tokens.
    pub token_keys: TokenKeys,
    /// The database connection, used to check the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request and the request executed normally if the token is
/// valid and belongs to a registered user, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => return Error::InvalidToken.into_response(),
    };

    let claims = match decode_token(bearer.token(), &state.token_keys) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    let user = lock_connection(&state.db_connection)
        .and_then(|connection| get_user_by_id(claims.sub, &connection));

    match user {
        Ok(_) => {}
        Err(Error::NotFound) => {
            tracing::warn!("Token for deleted user {} was rejected.", claims.sub);
            return Error::InvalidToken.into_response();
        }
        Err(error) => return error.into_response(),
    }

    parts.extensions.insert(claims.sub);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
