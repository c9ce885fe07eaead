//! メニュー紐付け
//!
//! どのメニュー項目にも紐付いていないレシピごとにメニュー項目を1つ作る。
//! 紐付け済みの集合は毎回リポジトリから読み直すので、続けて実行しても増えない。
//! 以前作った項目（同じ派生id）が紐付けを外されて残っている場合は、作らずに付け直す。
//! 同時に複数走らせることは想定していない（呼び出し側で直列化する）。

use crate::error::{ImportError, Result};
use crate::repository::Repository;
use recipe_import_common::{MenuItem, MenuRecipeStatus, RecipeSummary};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub created: usize,
    /// 既存の派生id項目に付け直した件数
    pub relinked: usize,
    pub failed: usize,
    /// 失敗ごとの `ImportError::ReconcileItemFailed`
    pub failures: Vec<ImportError>,
    pub created_ids: Vec<String>,
}

/// レシピidから決まるメニュー項目id
pub fn menu_item_id(recipe_id: &str) -> String {
    let digest = Sha256::digest(recipe_id.as_bytes());
    format!("menu-{}", &hex::encode(digest)[..16])
}

pub struct MenuLinkReconciler<'a> {
    repository: &'a dyn Repository,
}

impl<'a> MenuLinkReconciler<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }

    /// 一覧の読み込み失敗はそのまま返し、項目ごとの作成失敗は集計する
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let recipes = self.repository.list_recipe_summaries().await?;
        let menu_items = self.repository.list_menu_items().await?;

        let linked: HashSet<&str> = menu_items
            .iter()
            .filter_map(|m| m.recipe_id.as_deref())
            .collect();

        let by_id: HashMap<&str, &MenuItem> =
            menu_items.iter().map(|m| (m.id.as_str(), m)).collect();

        let mut report = ReconcileReport::default();

        for recipe in recipes.iter().filter(|r| !linked.contains(r.id.as_str())) {
            report.attempted += 1;
            let derived_id = menu_item_id(&recipe.id);

            let result = match by_id.get(derived_id.as_str()) {
                Some(orphan) if orphan.recipe_id.is_none() => {
                    let mut item = (*orphan).clone();
                    item.recipe_id = Some(recipe.id.clone());
                    item.recipe_status = MenuRecipeStatus::Mapped;
                    self.repository
                        .update_menu_item(&item)
                        .await
                        .map(|()| Link::Relinked(item.id))
                }
                _ => {
                    let item = new_menu_item(recipe);
                    self.repository
                        .create_menu_item(&item)
                        .await
                        .map(|()| Link::Created(item.id))
                }
            };

            match result {
                Ok(Link::Created(id)) => {
                    report.created += 1;
                    report.created_ids.push(id);
                }
                Ok(Link::Relinked(id)) => {
                    debug!(recipe_id = %recipe.id, menu_item_id = %id, "既存のメニュー項目に付け直し");
                    report.relinked += 1;
                }
                Err(e) => {
                    warn!(recipe_id = %recipe.id, error = %e, "メニュー項目の作成に失敗");
                    report.failed += 1;
                    report.failures.push(ImportError::ReconcileItemFailed {
                        recipe_id: recipe.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            created = report.created,
            relinked = report.relinked,
            failed = report.failed,
            "メニュー紐付け完了"
        );
        Ok(report)
    }
}

enum Link {
    Created(String),
    Relinked(String),
}

fn new_menu_item(recipe: &RecipeSummary) -> MenuItem {
    MenuItem {
        id: menu_item_id(&recipe.id),
        name: recipe.name.clone(),
        category: DEFAULT_CATEGORY.to_string(),
        external_pos_id: None,
        recipe_id: Some(recipe.id.clone()),
        recipe_status: MenuRecipeStatus::Mapped,
    }
}
