//! Core library for the FoodNest backend: user accounts and roles, auth
//! tokens, the password-reset code flow, menu storage, and prep-request
//! workflow.

mod error;
pub mod mailer;
mod menu;
mod prep;
mod reset;
pub mod user;

pub use error::{Result, ServiceError};
pub use mailer::{LogMailer, Mailer};
pub use menu::{
    Combo, ComboItemRef, ComboStatus, ComboView, CreateComboRequest, CreateFoodRequest, FoodItem,
    MenuManager, Quantity, RawMaterial, UpdateComboRequest, UpdateFoodRequest,
};
pub use prep::{CreatePrepRequest, FoodSnapshot, PrepManager, PrepRequest, PrepStatus};
pub use reset::{ResetCode, ResetManager, ResetPolicy};
pub use user::{
    mask_account_number, normalize_email, valid_email, AuthResponse, CreateUserRequest,
    LoginRequest, RegisterRequest, RegistrationRequest, Role, TokenClaims, UpdateUserRequest,
    User, UserManager, UserSummary,
};
