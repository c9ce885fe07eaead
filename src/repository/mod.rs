//! レシピ・材料カタログ・メニュー項目の永続化
//!
//! 取込パイプラインとメニュー紐付けは `Repository` trait 越しにだけ保存先へ触れる。

mod json_store;

pub use json_store::JsonRepository;

use crate::error::Result;
use async_trait::async_trait;
use recipe_import_common::{CatalogEntry, MenuItem, Recipe, RecipeSummary};

#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_recipes(&self) -> Result<Vec<Recipe>>;

    async fn list_recipe_summaries(&self) -> Result<Vec<RecipeSummary>> {
        Ok(self.list_recipes().await?.iter().map(Recipe::summary).collect())
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>>;

    /// 同じidがあれば上書き
    async fn save_recipe(&self, recipe: &Recipe) -> Result<()>;

    /// 削除したレシピを参照していたメニュー項目は紐付けが外れる
    async fn delete_recipe(&self, id: &str) -> Result<bool>;

    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>>;

    async fn save_catalog_entry(&self, entry: &CatalogEntry) -> Result<()>;

    async fn delete_catalog_entry(&self, id: &str) -> Result<bool>;

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>>;

    /// idの重複、存在しないレシピへの紐付け、紐付け済みレシピへの二重紐付けはエラー
    async fn create_menu_item(&self, item: &MenuItem) -> Result<()>;

    async fn update_menu_item(&self, item: &MenuItem) -> Result<()>;

    async fn delete_menu_item(&self, id: &str) -> Result<bool>;
}
