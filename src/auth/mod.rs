//! User accounts, password handling and bearer token authentication.

mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod register;
mod token;
mod user;

pub use forgot_password::request_password_reset;
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{change_password, get_current_user, update_profile};
pub use register::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys, decode_token, encode_token};
pub use user::{
    NewUser, User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id,
    parse_email, update_password, update_user_name,
};
