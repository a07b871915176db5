mod admin;
mod auth;
mod combos;
mod foods;
mod health;
mod prep;
mod reset;
mod users;

pub use admin::{
    approve_request, create_user, decline_request, delete_user, list_all_users, list_requests,
    update_bank_details, update_user,
};
pub use auth::{get_me, login, register_request};
pub use combos::{create_combo, delete_combo, list_combos, update_combo};
pub use foods::{create_food, delete_food, list_foods, update_food};
pub use health::{handler_404, health};
pub use prep::{create_prep_request, list_prep_requests, update_prep_request};
pub use reset::{forgot_password, reset_password, verify_reset_code};
pub use users::list_users;
