//! 菜单模块：菜品与套餐

mod manager;
mod models;

pub use manager::MenuManager;
pub use models::{
    Combo, ComboItemRef, ComboStatus, ComboView, CreateComboRequest, CreateFoodRequest, FoodItem,
    Quantity, RawMaterial, UpdateComboRequest, UpdateFoodRequest,
};
