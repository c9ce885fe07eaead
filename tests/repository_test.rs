//! JSONファイルリポジトリのテスト

use chrono::Utc;
use recipe_import_common::{
    CatalogEntry, Confidence, DraftRecipe, MenuItem, MenuRecipeStatus, RawIngredientLine, Recipe,
    RecipeSource, RecipeStatus,
};
use recipe_import_rust::error::ImportError;
use recipe_import_rust::repository::{JsonRepository, Repository};
use tempfile::tempdir;

fn recipe(id: &str, name: &str) -> Recipe {
    Recipe::from_draft(
        id.to_string(),
        DraftRecipe {
            name: name.to_string(),
            ingredients: vec![RawIngredientLine {
                text: "2 cups AP Flour".to_string(),
                quantity: Some(2.0),
                unit: Some("cups".to_string()),
                name: "AP Flour".to_string(),
            }],
            confidence: Confidence::High,
        },
        RecipeSource::text(Some("pancakes.txt")),
        Utc::now(),
    )
}

fn menu_item(id: &str, recipe_id: Option<&str>) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: format!("Item {}", id),
        category: "Breakfast".to_string(),
        external_pos_id: None,
        recipe_id: recipe_id.map(str::to_string),
        recipe_status: MenuRecipeStatus::Mapped,
    }
}

/// 保存して開き直すと同じ内容が読める
#[tokio::test]
async fn test_persist_and_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("store.json");

    {
        let repo = JsonRepository::open(&path).unwrap();
        repo.save_recipe(&recipe("r1", "Pancakes")).await.unwrap();
        repo.save_catalog_entry(&CatalogEntry::new("c1", "All-Purpose Flour").with_alias("AP Flour"))
            .await
            .unwrap();
        repo.create_menu_item(&menu_item("m1", Some("r1"))).await.unwrap();
    }
    assert!(path.exists());

    let reopened = JsonRepository::open(&path).unwrap();
    let stored = reopened.get_recipe("r1").await.unwrap().unwrap();
    assert_eq!(stored, recipe_with_times("r1", "Pancakes", &stored));

    let catalog = reopened.list_catalog().await.unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog[0].aliases.contains("AP Flour"));
    assert!(catalog[0].is_active);

    let items = reopened.list_menu_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].recipe_id.as_deref(), Some("r1"));
}

fn recipe_with_times(id: &str, name: &str, stored: &Recipe) -> Recipe {
    let mut expected = recipe(id, name);
    expected.created_at = stored.created_at;
    expected.last_updated = stored.last_updated;
    expected
}

/// 存在しないファイルは空で開く
#[tokio::test]
async fn test_open_missing_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("store.json");

    let repo = JsonRepository::open(&path).unwrap();
    assert!(repo.list_recipes().await.unwrap().is_empty());
    assert!(!path.exists());

    repo.save_recipe(&recipe("r1", "Pancakes")).await.unwrap();
    assert!(path.exists());
}

/// 壊れたファイルはリポジトリエラー
#[test]
fn test_open_corrupt_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ broken").unwrap();

    let result = JsonRepository::open(&path);
    assert!(matches!(result, Err(ImportError::Repository(_))));
}

/// 同じidの保存は上書き
#[tokio::test]
async fn test_save_recipe_upserts() {
    let repo = JsonRepository::in_memory();
    let mut r = recipe("r1", "Pancakes");
    repo.save_recipe(&r).await.unwrap();

    r.status = RecipeStatus::ReadyToImport;
    repo.save_recipe(&r).await.unwrap();

    let recipes = repo.list_recipes().await.unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].status, RecipeStatus::ReadyToImport);

    let summaries = repo.list_recipe_summaries().await.unwrap();
    assert_eq!(summaries[0].id, "r1");
    assert_eq!(summaries[0].name, "Pancakes");
}

/// 存在しないレシピへの紐付けは失敗
#[tokio::test]
async fn test_dangling_link_rejected() {
    let repo = JsonRepository::in_memory();
    let result = repo.create_menu_item(&menu_item("m1", Some("ghost"))).await;

    assert!(matches!(result, Err(ImportError::Repository(_))));
    assert!(repo.list_menu_items().await.unwrap().is_empty());
}

/// 1つのレシピに2つ目のメニュー項目は紐付けられない
#[tokio::test]
async fn test_second_link_rejected() {
    let repo = JsonRepository::in_memory();
    repo.save_recipe(&recipe("r1", "Pancakes")).await.unwrap();
    repo.create_menu_item(&menu_item("m1", Some("r1"))).await.unwrap();

    let result = repo.create_menu_item(&menu_item("m2", Some("r1"))).await;
    assert!(matches!(result, Err(ImportError::Repository(_))));

    // 更新で別項目から奪うのも不可
    repo.create_menu_item(&menu_item("m3", None)).await.unwrap();
    let result = repo.update_menu_item(&menu_item("m3", Some("r1"))).await;
    assert!(matches!(result, Err(ImportError::Repository(_))));

    // 自分自身の更新は可
    let mut m1 = menu_item("m1", Some("r1"));
    m1.name = "Pancake Stack".to_string();
    repo.update_menu_item(&m1).await.unwrap();
}

/// idの重複は失敗
#[tokio::test]
async fn test_duplicate_menu_item_id_rejected() {
    let repo = JsonRepository::in_memory();
    repo.create_menu_item(&menu_item("m1", None)).await.unwrap();

    let result = repo.create_menu_item(&menu_item("m1", None)).await;
    assert!(matches!(result, Err(ImportError::Repository(_))));
}

/// レシピを消すと紐付けが外れる
#[tokio::test]
async fn test_delete_recipe_clears_back_reference() {
    let repo = JsonRepository::in_memory();
    repo.save_recipe(&recipe("r1", "Pancakes")).await.unwrap();
    repo.create_menu_item(&menu_item("m1", Some("r1"))).await.unwrap();

    assert!(repo.delete_recipe("r1").await.unwrap());
    assert!(!repo.delete_recipe("r1").await.unwrap());

    let items = repo.list_menu_items().await.unwrap();
    assert_eq!(items[0].recipe_id, None);
    assert_eq!(items[0].recipe_status, MenuRecipeStatus::Missing);
}

/// 失敗した書き込みはメモリにも残らない
#[tokio::test]
async fn test_failed_write_leaves_state_unchanged() {
    let dir = tempdir().expect("Failed to create temp dir");
    // 親がファイルなので保存先ディレクトリを作れない
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file").unwrap();
    let path = blocker.join("store.json");

    let repo = JsonRepository::open(&path).unwrap();
    let result = repo.save_recipe(&recipe("r1", "Pancakes")).await;

    assert!(result.is_err());
    assert!(repo.list_recipes().await.unwrap().is_empty());
}

/// 並行した書き込みはすべてファイルに残る
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_writes_all_persisted() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("store.json");
    let repo = std::sync::Arc::new(JsonRepository::open(&path).unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.save_recipe(&recipe(&format!("r{}", i), "Pancakes")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(repo.list_recipes().await.unwrap().len(), 8);
    assert!(!path.with_extension("json.tmp").exists());

    let reopened = JsonRepository::open(&path).unwrap();
    assert_eq!(reopened.list_recipes().await.unwrap().len(), 8);
}

/// カタログ項目の削除
#[tokio::test]
async fn test_delete_catalog_entry() {
    let repo = JsonRepository::in_memory();
    repo.save_catalog_entry(&CatalogEntry::new("c1", "Egg")).await.unwrap();

    assert!(repo.delete_catalog_entry("c1").await.unwrap());
    assert!(repo.list_catalog().await.unwrap().is_empty());
}

/// メニュー項目の削除
#[tokio::test]
async fn test_delete_menu_item() {
    let repo = JsonRepository::in_memory();
    repo.create_menu_item(&menu_item("m1", None)).await.unwrap();

    assert!(repo.delete_menu_item("m1").await.unwrap());
    assert!(!repo.delete_menu_item("m1").await.unwrap());
}
