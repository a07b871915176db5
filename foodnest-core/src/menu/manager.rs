//! 菜单管理器：菜品与套餐的落盘 CRUD

use super::models::*;
use crate::error::{Result, ServiceError};
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// 菜单管理器
#[derive(Debug, Clone)]
pub struct MenuManager {
    data_dir: PathBuf,
}

impl MenuManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn foods_dir(&self) -> PathBuf {
        self.data_dir.join("foods")
    }

    fn combos_dir(&self) -> PathBuf {
        self.data_dir.join("combos")
    }

    fn food_path(&self, id: &str) -> PathBuf {
        self.foods_dir().join(format!("{}.json", id))
    }

    fn combo_path(&self, id: &str) -> PathBuf {
        self.combos_dir().join(format!("{}.json", id))
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.foods_dir()).await?;
        tokio::fs::create_dir_all(self.combos_dir()).await?;
        Ok(())
    }

    async fn persist_food(&self, food: &FoodItem) -> Result<()> {
        let data = serde_json::to_vec(food)?;
        tokio::fs::write(self.food_path(&food.id), data).await?;
        Ok(())
    }

    async fn persist_combo(&self, combo: &Combo) -> Result<()> {
        let data = serde_json::to_vec(combo)?;
        tokio::fs::write(self.combo_path(&combo.id), data).await?;
        Ok(())
    }
}

// ============================================================================
// 菜品
// ============================================================================

impl MenuManager {
    /// 创建菜品
    #[instrument(skip(self, req))]
    pub async fn create_food(&self, req: CreateFoodRequest) -> Result<FoodItem> {
        self.ensure_dirs().await?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }
        let category = req.category.trim().to_string();
        if category.is_empty() {
            return Err(ServiceError::Validation("category is required".into()));
        }
        if req.price < 0.0 {
            return Err(ServiceError::Validation("price must be >= 0".into()));
        }

        let now = Utc::now();
        let food = FoodItem {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            price: req.price,
            category,
            available: req.available.unwrap_or(true),
            tax: req.tax.unwrap_or(0.0),
            image_url: req.image_url,
            image_path: req.image_path,
            raw_materials: req.raw_materials.unwrap_or_default(),
            total_quantity: req.total_quantity,
            per_serving: req.per_serving,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.persist_food(&food).await?;

        info!(food_id = %food.id, "created food item");
        Ok(food)
    }

    /// 读取菜品
    pub async fn get_food(&self, id: &str) -> Result<FoodItem> {
        let path = self.food_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("food: {}", id)));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 列出全部菜品（创建时间倒序）
    #[instrument(skip(self))]
    pub async fn list_foods(&self) -> Result<Vec<FoodItem>> {
        self.ensure_dirs().await?;
        let mut foods = Vec::new();
        let mut entries = tokio::fs::read_dir(self.foods_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(data) = tokio::fs::read(&path).await {
                    if let Ok(food) = serde_json::from_slice::<FoodItem>(&data) {
                        foods.push(food);
                    }
                }
            }
        }
        foods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(foods)
    }

    /// 部分更新菜品
    #[instrument(skip(self, req))]
    pub async fn update_food(&self, id: &str, req: UpdateFoodRequest) -> Result<FoodItem> {
        let mut food = self.get_food(id).await?;

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::Validation("name is required".into()));
            }
            food.name = name;
        }
        if let Some(price) = req.price {
            if price < 0.0 {
                return Err(ServiceError::Validation("price must be >= 0".into()));
            }
            food.price = price;
        }
        if let Some(category) = req.category {
            food.category = category.trim().to_string();
        }
        if let Some(available) = req.available {
            food.available = available;
        }
        if let Some(tax) = req.tax {
            food.tax = tax;
        }
        if let Some(image_url) = req.image_url {
            food.image_url = Some(image_url);
        }
        if let Some(image_path) = req.image_path {
            food.image_path = Some(image_path);
        }
        if let Some(raw_materials) = req.raw_materials {
            food.raw_materials = raw_materials;
        }
        if let Some(total_quantity) = req.total_quantity {
            food.total_quantity = Some(total_quantity);
        }
        if let Some(per_serving) = req.per_serving {
            food.per_serving = Some(per_serving);
        }

        food.updated_at = Some(Utc::now());
        self.persist_food(&food).await?;
        info!(food_id = %id, "updated food item");
        Ok(food)
    }

    /// 删除菜品
    #[instrument(skip(self))]
    pub async fn delete_food(&self, id: &str) -> Result<()> {
        let path = self.food_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("food: {}", id)));
        }
        tokio::fs::remove_file(path).await?;
        info!(food_id = %id, "deleted food item");
        Ok(())
    }
}

// ============================================================================
// 套餐
// ============================================================================

impl MenuManager {
    /// 校验套餐引用的菜品全部存在
    async fn validate_item_ids(&self, item_ids: &[String]) -> Result<()> {
        if item_ids.is_empty() {
            return Err(ServiceError::Validation("item_ids must not be empty".into()));
        }
        for id in item_ids {
            if !tokio::fs::try_exists(self.food_path(id)).await.unwrap_or(false) {
                return Err(ServiceError::Validation(format!("invalid item id: {}", id)));
            }
        }
        Ok(())
    }

    /// 展开套餐视图（缺失的菜品跳过）
    async fn combo_view(&self, combo: Combo) -> ComboView {
        let futures: Vec<_> = combo
            .items
            .iter()
            .map(|id| self.get_food(id))
            .collect();
        let items = join_all(futures)
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .map(|f| ComboItemRef {
                id: f.id,
                name: f.name,
                price: f.price,
                image_url: f.image_url,
            })
            .collect();
        ComboView {
            id: combo.id,
            name: combo.name,
            items,
            price: combo.price,
            status: combo.status,
            created_at: combo.created_at,
        }
    }

    /// 创建套餐
    #[instrument(skip(self, req))]
    pub async fn create_combo(&self, req: CreateComboRequest) -> Result<ComboView> {
        self.ensure_dirs().await?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }
        if req.price < 0.0 {
            return Err(ServiceError::Validation("price must be >= 0".into()));
        }
        self.validate_item_ids(&req.item_ids).await?;

        let now = Utc::now();
        let combo = Combo {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            items: req.item_ids,
            price: req.price,
            status: req.status.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.persist_combo(&combo).await?;

        info!(combo_id = %combo.id, "created combo");
        Ok(self.combo_view(combo).await)
    }

    async fn get_combo(&self, id: &str) -> Result<Combo> {
        let path = self.combo_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("combo: {}", id)));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 列出全部套餐（创建时间倒序，菜品信息展开）
    #[instrument(skip(self))]
    pub async fn list_combos(&self) -> Result<Vec<ComboView>> {
        self.ensure_dirs().await?;
        let mut combos = Vec::new();
        let mut entries = tokio::fs::read_dir(self.combos_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(data) = tokio::fs::read(&path).await {
                    if let Ok(combo) = serde_json::from_slice::<Combo>(&data) {
                        combos.push(combo);
                    }
                }
            }
        }
        combos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let futures: Vec<_> = combos.into_iter().map(|c| self.combo_view(c)).collect();
        Ok(join_all(futures).await)
    }

    /// 部分更新套餐
    #[instrument(skip(self, req))]
    pub async fn update_combo(&self, id: &str, req: UpdateComboRequest) -> Result<ComboView> {
        let mut combo = self.get_combo(id).await?;

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if !name.is_empty() {
                combo.name = name;
            }
        }
        if let Some(item_ids) = req.item_ids {
            self.validate_item_ids(&item_ids).await?;
            combo.items = item_ids;
        }
        if let Some(price) = req.price {
            if price < 0.0 {
                return Err(ServiceError::Validation("price must be >= 0".into()));
            }
            combo.price = price;
        }
        if let Some(status) = req.status {
            combo.status = status;
        }

        combo.updated_at = Some(Utc::now());
        self.persist_combo(&combo).await?;
        info!(combo_id = %id, "updated combo");
        Ok(self.combo_view(combo).await)
    }

    /// 删除套餐
    #[instrument(skip(self))]
    pub async fn delete_combo(&self, id: &str) -> Result<()> {
        let path = self.combo_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("combo: {}", id)));
        }
        tokio::fs::remove_file(path).await?;
        info!(combo_id = %id, "deleted combo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn food_req(name: &str, price: f64) -> CreateFoodRequest {
        CreateFoodRequest {
            name: name.into(),
            price,
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
    async fn food_crud() {
        let dir = TempDir::new().unwrap();
        let menu = MenuManager::new(dir.path());

        let food = menu.create_food(food_req("Pad Thai", 95.0)).await.unwrap();
        assert!(food.available);
        assert_eq!(food.tax, 0.0);

        let updated = menu
            .update_food(
                &food.id,
                UpdateFoodRequest {
                    price: Some(99.0),
                    available: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 99.0);
        assert!(!updated.available);

        assert_eq!(menu.list_foods().await.unwrap().len(), 1);
        menu.delete_food(&food.id).await.unwrap();
        assert!(menu.get_food(&food.id).await.is_err());
    }

    #[tokio::test]
    async fn combo_rejects_unknown_items() {
        let dir = TempDir::new().unwrap();
        let menu = MenuManager::new(dir.path());
        let food = menu.create_food(food_req("Green Curry", 120.0)).await.unwrap();

        let bad = menu
            .create_combo(CreateComboRequest {
                name: "Lunch Set".into(),
                item_ids: vec![food.id.clone(), "missing".into()],
                price: 150.0,
                status: None,
            })
            .await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));

        let combo = menu
            .create_combo(CreateComboRequest {
                name: "Lunch Set".into(),
                item_ids: vec![food.id.clone()],
                price: 150.0,
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(combo.status, ComboStatus::Active);
        assert_eq!(combo.items.len(), 1);
        assert_eq!(combo.items[0].name, "Green Curry");
    }
}
