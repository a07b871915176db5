//! 备餐请求工作流
//!
//! 主管把菜品派给厨师备餐，卡片带一份创建时刻的菜品快照，
//! 后续菜单怎么改都不影响已派出的卡片。

use crate::error::{Result, ServiceError};
use crate::menu::{MenuManager, Quantity, RawMaterial};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// 备餐状态流转：queued -> processing -> ready -> picked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrepStatus {
    Queued,
    Processing,
    Ready,
    Picked,
}

impl PrepStatus {
    /// 解析状态字符串，未知值返回 None（调用方按忽略处理）
    pub fn parse(raw: &str) -> Option<PrepStatus> {
        match raw {
            "queued" => Some(PrepStatus::Queued),
            "processing" => Some(PrepStatus::Processing),
            "ready" => Some(PrepStatus::Ready),
            "picked" => Some(PrepStatus::Picked),
            _ => None,
        }
    }
}

/// 发送时刻的菜品快照（不可变）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSnapshot {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub tax: f64,
    pub available: bool,
    pub image_url: Option<String>,
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,
    pub total_quantity: Option<Quantity>,
    pub per_serving: Option<Quantity>,
}

/// 备餐请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepRequest {
    pub id: String,
    pub food_id: String,
    pub food_snapshot: FoodSnapshot,
    pub cook_id: String,
    pub requested_by: String,
    pub status: PrepStatus,
    #[serde(default)]
    pub quantity_to_prepare: u32,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建备餐请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrepRequest {
    pub food_id: String,
    pub cook_id: String,
    pub quantity_to_prepare: Option<u32>,
}

/// 备餐请求管理器
#[derive(Debug, Clone)]
pub struct PrepManager {
    data_dir: PathBuf,
    menu: MenuManager,
}

impl PrepManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, menu: MenuManager) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            menu,
        }
    }

    fn prep_dir(&self) -> PathBuf {
        self.data_dir.join("prep_requests")
    }

    fn prep_path(&self, id: &str) -> PathBuf {
        self.prep_dir().join(format!("{}.json", id))
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.prep_dir()).await?;
        Ok(())
    }

    async fn persist(&self, request: &PrepRequest) -> Result<()> {
        let data = serde_json::to_vec(request)?;
        tokio::fs::write(self.prep_path(&request.id), data).await?;
        Ok(())
    }

    /// 创建备餐请求并拍快照
    #[instrument(skip(self, req))]
    pub async fn create(&self, req: CreatePrepRequest, requested_by: &str) -> Result<PrepRequest> {
        self.ensure_dirs().await?;

        let food = self.menu.get_food(&req.food_id).await?;
        let now = Utc::now();
        let request = PrepRequest {
            id: uuid::Uuid::new_v4().to_string(),
            food_id: req.food_id,
            food_snapshot: FoodSnapshot {
                name: food.name,
                price: food.price,
                category: food.category,
                tax: food.tax,
                available: food.available,
                image_url: food.image_url,
                raw_materials: food.raw_materials,
                total_quantity: food.total_quantity,
                per_serving: food.per_serving,
            },
            cook_id: req.cook_id,
            requested_by: requested_by.to_string(),
            status: PrepStatus::Queued,
            quantity_to_prepare: req.quantity_to_prepare.unwrap_or(0),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.persist(&request).await?;

        info!(prep_id = %request.id, cook_id = %request.cook_id, "created prep request");
        Ok(request)
    }

    async fn get(&self, id: &str) -> Result<PrepRequest> {
        let path = self.prep_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("prep request: {}", id)));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 列出备餐请求，可按厨师/状态过滤（创建时间倒序）
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        cook_id: Option<&str>,
        status: Option<PrepStatus>,
    ) -> Result<Vec<PrepRequest>> {
        self.ensure_dirs().await?;
        let mut items = Vec::new();
        let mut entries = tokio::fs::read_dir(self.prep_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(data) = tokio::fs::read(&path).await {
                    if let Ok(item) = serde_json::from_slice::<PrepRequest>(&data) {
                        let cook_ok = cook_id.map(|c| item.cook_id == c).unwrap_or(true);
                        let status_ok = status.map(|s| item.status == s).unwrap_or(true);
                        if cook_ok && status_ok {
                            items.push(item);
                        }
                    }
                }
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// 更新状态与数量
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: &str,
        status: Option<PrepStatus>,
        quantity_to_prepare: Option<u32>,
    ) -> Result<PrepRequest> {
        let mut request = self.get(id).await?;

        if let Some(status) = status {
            request.status = status;
        }
        if let Some(quantity) = quantity_to_prepare {
            request.quantity_to_prepare = quantity;
        }
        request.updated_at = Utc::now();
        self.persist(&request).await?;

        info!(prep_id = %id, "updated prep request");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{CreateFoodRequest, UpdateFoodRequest};
    use tempfile::TempDir;

    async fn fixture() -> (TempDir, MenuManager, PrepManager) {
        let dir = TempDir::new().unwrap();
        let menu = MenuManager::new(dir.path());
        let prep = PrepManager::new(dir.path(), menu.clone());
        (dir, menu, prep)
    }

    fn food_req(name: &str) -> CreateFoodRequest {
        CreateFoodRequest {
            name: name.into(),
            price: 80.0,
            category: "main".into(),
            available: None,
            tax: None,
            image_url: None,
            image_path: None,
            raw_materials: None,
            total_quantity: None,
            per_serving: None,
        }
    }

    #[tokio::test]
    async fn snapshot_survives_food_edits() {
        let (_dir, menu, prep) = fixture().await;
        let food = menu.create_food(food_req("Tom Yum")).await.unwrap();

        let request = prep
            .create(
                CreatePrepRequest {
                    food_id: food.id.clone(),
                    cook_id: "cook-1".into(),
                    quantity_to_prepare: Some(4),
                },
                "supervisor-1",
            )
            .await
            .unwrap();
        assert_eq!(request.status, PrepStatus::Queued);
        assert_eq!(request.food_snapshot.price, 80.0);

        menu.update_food(
            &food.id,
            UpdateFoodRequest {
                price: Some(200.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let listed = prep.list(Some("cook-1"), None).await.unwrap();
        assert_eq!(listed[0].food_snapshot.price, 80.0);
    }

    #[tokio::test]
    async fn create_requires_existing_food() {
        let (_dir, _menu, prep) = fixture().await;
        let result = prep
            .create(
                CreatePrepRequest {
                    food_id: "missing".into(),
                    cook_id: "cook-1".into(),
                    quantity_to_prepare: None,
                },
                "supervisor-1",
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_filters_by_cook_and_status() {
        let (_dir, menu, prep) = fixture().await;
        let food = menu.create_food(food_req("Khao Pad")).await.unwrap();

        let a = prep
            .create(
                CreatePrepRequest {
                    food_id: food.id.clone(),
                    cook_id: "cook-1".into(),
                    quantity_to_prepare: None,
                },
                "sup",
            )
            .await
            .unwrap();
        prep.create(
            CreatePrepRequest {
                food_id: food.id.clone(),
                cook_id: "cook-2".into(),
                quantity_to_prepare: None,
            },
            "sup",
        )
        .await
        .unwrap();

        prep.update(&a.id, Some(PrepStatus::Processing), Some(2))
            .await
            .unwrap();

        assert_eq!(prep.list(Some("cook-1"), None).await.unwrap().len(), 1);
        assert_eq!(
            prep.list(None, Some(PrepStatus::Processing))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(prep.list(None, None).await.unwrap().len(), 2);

        // 未知状态字符串解析为 None，更新时按忽略处理
        assert!(PrepStatus::parse("cancelled").is_none());
    }
}
