//! JSONファイル1つに全データを保存するリポジトリ
//!
//! 書き込みは複製した状態に適用し、保存に成功してから差し替える。
//! 保存に失敗した変更はメモリにも残らない。
//! 書き込みは非同期ロックで直列化し、ファイル入出力は tokio::fs で行う。

use super::Repository;
use crate::error::{ImportError, Result};
use async_trait::async_trait;
use recipe_import_common::{CatalogEntry, MenuItem, MenuRecipeStatus, Recipe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 保存ファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    /// バージョン（互換性チェック用）
    version: u32,
    #[serde(default)]
    recipes: BTreeMap<String, Recipe>,
    #[serde(default)]
    catalog: BTreeMap<String, CatalogEntry>,
    /// 作成順を保持
    #[serde(default)]
    menu_items: Vec<MenuItem>,
}

impl StoreFile {
    const CURRENT_VERSION: u32 = 1;

    fn check_menu_item(&self, item: &MenuItem, replacing: Option<&str>) -> Result<()> {
        if item.id.trim().is_empty() {
            return Err(ImportError::Repository("メニュー項目のidが空です".into()));
        }

        let Some(recipe_id) = item.recipe_id.as_deref() else {
            return Ok(());
        };

        if !self.recipes.contains_key(recipe_id) {
            return Err(ImportError::Repository(format!(
                "存在しないレシピには紐付けできません: {}",
                recipe_id
            )));
        }

        let linked_elsewhere = self.menu_items.iter().any(|m| {
            m.recipe_id.as_deref() == Some(recipe_id) && Some(m.id.as_str()) != replacing
        });
        if linked_elsewhere {
            return Err(ImportError::Repository(format!(
                "レシピは既に別のメニュー項目に紐付いています: {}",
                recipe_id
            )));
        }

        Ok(())
    }
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            recipes: BTreeMap::new(),
            catalog: BTreeMap::new(),
            menu_items: Vec::new(),
        }
    }
}

pub struct JsonRepository {
    /// Noneならメモリ上のみ
    path: Option<PathBuf>,
    state: Mutex<StoreFile>,
}

impl JsonRepository {
    /// 保存ファイルを開く（無ければ空で開始し、最初の書き込みで作成）
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let store: StoreFile = serde_json::from_reader(reader).map_err(|e| {
                ImportError::Repository(format!("保存ファイルを読めません ({}): {}", path.display(), e))
            })?;
            if store.version != StoreFile::CURRENT_VERSION {
                return Err(ImportError::Repository(format!(
                    "保存ファイルのバージョンが違います: {} (対応: {})",
                    store.version,
                    StoreFile::CURRENT_VERSION
                )));
            }
            info!(
                path = %path.display(),
                recipes = store.recipes.len(),
                catalog = store.catalog.len(),
                menu_items = store.menu_items.len(),
                "保存ファイルを読み込み"
            );
            store
        } else {
            StoreFile::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreFile::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn read<T>(&self, f: impl FnOnce(&StoreFile) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// 保存が終わるまでロックを持つので、書き込みの順序とファイルの内容が一致する
    async fn write<T>(&self, f: impl FnOnce(&mut StoreFile) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let value = f(&mut next)?;

        if let Some(path) = &self.path {
            persist(path, &next).await?;
        }

        *state = next;
        Ok(value)
    }
}

/// 一時ファイルに書いてから置き換える
async fn persist(path: &Path, store: &StoreFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let bytes = serde_json::to_vec_pretty(store)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    debug!(path = %path.display(), "保存ファイルを書き込み");
    Ok(())
}

#[async_trait]
impl Repository for JsonRepository {
    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        Ok(self.read(|s| s.recipes.values().cloned().collect()).await)
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        Ok(self.read(|s| s.recipes.get(id).cloned()).await)
    }

    async fn save_recipe(&self, recipe: &Recipe) -> Result<()> {
        if recipe.id.trim().is_empty() {
            return Err(ImportError::Repository("レシピのidが空です".into()));
        }
        self.write(|s| {
            s.recipes.insert(recipe.id.clone(), recipe.clone());
            Ok(())
        })
        .await
    }

    async fn delete_recipe(&self, id: &str) -> Result<bool> {
        self.write(|s| {
            if s.recipes.remove(id).is_none() {
                return Ok(false);
            }
            for item in s.menu_items.iter_mut() {
                if item.recipe_id.as_deref() == Some(id) {
                    item.recipe_id = None;
                    item.recipe_status = MenuRecipeStatus::Missing;
                }
            }
            Ok(true)
        })
        .await
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.read(|s| s.catalog.values().cloned().collect()).await)
    }

    async fn save_catalog_entry(&self, entry: &CatalogEntry) -> Result<()> {
        if entry.id.trim().is_empty() {
            return Err(ImportError::Repository("カタログ項目のidが空です".into()));
        }
        self.write(|s| {
            s.catalog.insert(entry.id.clone(), entry.clone());
            Ok(())
        })
        .await
    }

    async fn delete_catalog_entry(&self, id: &str) -> Result<bool> {
        self.write(|s| Ok(s.catalog.remove(id).is_some())).await
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        Ok(self.read(|s| s.menu_items.clone()).await)
    }

    async fn create_menu_item(&self, item: &MenuItem) -> Result<()> {
        self.write(|s| {
            if s.menu_items.iter().any(|m| m.id == item.id) {
                return Err(ImportError::Repository(format!(
                    "メニュー項目のidが重複しています: {}",
                    item.id
                )));
            }
            s.check_menu_item(item, None)?;
            s.menu_items.push(item.clone());
            Ok(())
        })
        .await
    }

    async fn update_menu_item(&self, item: &MenuItem) -> Result<()> {
        self.write(|s| {
            s.check_menu_item(item, Some(&item.id))?;
            let slot = s
                .menu_items
                .iter_mut()
                .find(|m| m.id == item.id)
                .ok_or_else(|| {
                    ImportError::Repository(format!("メニュー項目がありません: {}", item.id))
                })?;
            *slot = item.clone();
            Ok(())
        })
        .await
    }

    async fn delete_menu_item(&self, id: &str) -> Result<bool> {
        self.write(|s| {
            let before = s.menu_items.len();
            s.menu_items.retain(|m| m.id != id);
            Ok(s.menu_items.len() != before)
        })
        .await
    }
}
