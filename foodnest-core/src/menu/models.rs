//! 菜单数据模型：单品与套餐

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// 原材料条目
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMaterial {
    pub name: String,
    pub qty: Option<f64>,
    pub unit: Option<String>,
}

/// 数量（份量/总量）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quantity {
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

/// 菜品
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub tax: f64,
    /// 图片由外部上传服务托管，这里只存路径/URL
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,
    pub total_quantity: Option<Quantity>,
    pub per_serving: Option<Quantity>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_available() -> bool {
    true
}

/// 创建菜品请求
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub available: Option<bool>,
    pub tax: Option<f64>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub raw_materials: Option<Vec<RawMaterial>>,
    pub total_quantity: Option<Quantity>,
    pub per_serving: Option<Quantity>,
}

/// 更新菜品请求（部分字段）
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFoodRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub tax: Option<f64>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub raw_materials: Option<Vec<RawMaterial>>,
    pub total_quantity: Option<Quantity>,
    pub per_serving: Option<Quantity>,
}

/// 套餐状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComboStatus {
    Active,
    Inactive,
}

impl Default for ComboStatus {
    fn default() -> Self {
        ComboStatus::Active
    }
}

/// 套餐（存储模型，只记菜品 ID）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    pub name: String,
    pub items: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub status: ComboStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 套餐里的菜品摘要
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboItemRef {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
}

/// 套餐视图（菜品信息展开）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboView {
    pub id: String,
    pub name: String,
    pub items: Vec<ComboItemRef>,
    pub price: f64,
    pub status: ComboStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// 创建套餐请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComboRequest {
    pub name: String,
    pub item_ids: Vec<String>,
    pub price: f64,
    pub status: Option<ComboStatus>,
}

/// 更新套餐请求（部分字段）
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateComboRequest {
    pub name: Option<String>,
    pub item_ids: Option<Vec<String>>,
    pub price: Option<f64>,
    pub status: Option<ComboStatus>,
}
