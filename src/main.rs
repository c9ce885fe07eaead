use anyhow::{anyhow, bail, Context};
use clap::Parser;
use recipe_import_common::{
    CatalogEntry, MenuRecipeStatus, Recipe, RecipeSource, RecipeStatus, SourceKind,
};
use recipe_import_rust::ai_cli::{CliSettings, CliStructurer, CliTextExtractor};
use recipe_import_rust::ai_provider::AiProvider;
use recipe_import_rust::orchestrator::{ImportOrchestrator, ProgressBarSink, ProgressSink};
use recipe_import_rust::{cli, config, reconciler, repository, scanner};
use cli::{Cli, Commands};
use config::Config;
use repository::{JsonRepository, Repository};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定ファイルの読み込みに失敗")?;
    let provider = cli.ai_provider.unwrap_or(config.ai_provider);
    let store_path = cli.store.clone().unwrap_or_else(|| config.resolve_store_path());

    match cli.command {
        Commands::Import { path, recursive, record_failures } => {
            println!("🍳 recipe-import - レシピ取込\n");

            // 1. 取込元スキャン
            println!("[1/3] 取込元をスキャン中...");
            let sources = scanner::scan_sources(&path, recursive)
                .with_context(|| format!("取込元を読めません: {}", path.display()))?;
            if sources.is_empty() {
                bail!("取込対象のファイルがありません: {}", path.display());
            }
            println!("✔ {}件の取込元を検出\n", sources.len());

            // 2. カタログ読み込み（取込中は同じスナップショットを使う）
            println!("[2/3] カタログを読み込み中...");
            let repo = open_store(&store_path)?;
            let catalog = repo.list_catalog().await?;
            println!("✔ カタログ {}件\n", catalog.len());

            // 3. 取込
            println!("[3/3] 取込中...({})", provider);
            let orchestrator = build_orchestrator(&config, provider);
            let mut imported = 0;
            let mut failed = 0;

            for source in &sources {
                match import_source(&orchestrator, source, &catalog).await {
                    Ok(recipe) => {
                        repo.save_recipe(&recipe).await?;
                        imported += 1;
                        println!("  ✔ {} → {}", source.file_name, recipe_line(&recipe));
                    }
                    Err(e) => {
                        failed += 1;
                        println!("  ✖ {}: {}", source.file_name, e);
                        if record_failures {
                            let name = file_stem(&source.path);
                            let record = orchestrator.failure_record(&name, source_of(source));
                            repo.save_recipe(&record).await?;
                        }
                    }
                }
            }

            println!("\n✅ 取込完了: 成功 {}件 / 失敗 {}件", imported, failed);
            println!("  保存先: {}", store_path.display());
        }

        Commands::Revalidate { id } => {
            println!("🔁 recipe-import - 再検証\n");

            let repo = open_store(&store_path)?;
            let catalog = repo.list_catalog().await?;
            let targets = match id {
                Some(id) => vec![repo
                    .get_recipe(&id)
                    .await?
                    .ok_or_else(|| anyhow!("レシピが見つかりません: {}", id))?],
                None => repo.list_recipes().await?,
            };

            let orchestrator = build_orchestrator(&config, provider);
            for recipe in &targets {
                let updated = orchestrator.revalidate(recipe, &catalog);
                repo.save_recipe(&updated).await?;
                if updated.status != recipe.status {
                    println!("  {} : {} → {}", updated.name, recipe.status, updated.status);
                } else {
                    println!("  {} : {}", updated.name, recipe_line(&updated));
                }
            }

            println!("\n✅ {}件を再検証", targets.len());
        }

        Commands::Reconcile => {
            println!("🔗 recipe-import - メニュー紐付け\n");

            let repo = open_store(&store_path)?;
            let report = reconciler::MenuLinkReconciler::new(&repo).reconcile().await?;

            for failure in &report.failures {
                println!("  ✖ {}", failure);
            }
            println!(
                "✅ 対象 {}件 / 作成 {}件 / 付け直し {}件 / 失敗 {}件",
                report.attempted, report.created, report.relinked, report.failed
            );
        }

        Commands::Catalog { load, list } => {
            let repo = open_store(&store_path)?;

            if let Some(load_path) = load {
                let content = std::fs::read_to_string(&load_path)
                    .with_context(|| format!("カタログを読めません: {}", load_path.display()))?;
                let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
                    .with_context(|| format!("カタログJSONが不正です: {}", load_path.display()))?;
                for entry in &entries {
                    repo.save_catalog_entry(entry).await?;
                }
                println!("✔ カタログ {}件を読み込みました", entries.len());
            }

            if list {
                let catalog = repo.list_catalog().await?;
                println!("材料カタログ ({}件):", catalog.len());
                for entry in &catalog {
                    let aliases = entry.aliases.iter().cloned().collect::<Vec<_>>().join(", ");
                    println!(
                        "  {} {} [{}]{}{}",
                        entry.id,
                        entry.canonical_name,
                        entry.unit,
                        if aliases.is_empty() { String::new() } else { format!(" 別名: {}", aliases) },
                        if entry.is_active { "" } else { " (無効)" }
                    );
                }
            }
        }

        Commands::List { issues } => {
            let repo = open_store(&store_path)?;
            let recipes = repo.list_recipes().await?;
            println!("レシピ ({}件):", recipes.len());
            for recipe in &recipes {
                println!("  {} {}", short_id(&recipe.id), recipe_line(recipe));
                if issues {
                    for issue in &recipe.issues {
                        match &issue.suggested_fix {
                            Some(fix) => println!("      - [{}] {} ({})", issue.kind, issue.message, fix),
                            None => println!("      - [{}] {}", issue.kind, issue.message),
                        }
                    }
                }
            }
        }

        Commands::Menu => {
            let repo = open_store(&store_path)?;
            let recipes: HashMap<String, Recipe> = repo
                .list_recipes()
                .await?
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();
            let items = repo.list_menu_items().await?;

            println!("メニュー項目 ({}件):", items.len());
            for item in &items {
                let recipe = item.recipe_id.as_deref().and_then(|id| recipes.get(id));
                let status = MenuRecipeStatus::derive(recipe);
                println!(
                    "  {} {} [{}] {}",
                    item.id,
                    item.name,
                    item.category,
                    status
                );
            }
        }

        Commands::Config { set_threshold, set_store, add_unit, set_provider, show } => {
            let mut changed = false;

            if let Some(threshold) = set_threshold {
                config.set_threshold(threshold)?;
                println!("✔ 類似判定の閾値を {} に設定しました", threshold);
                changed = true;
            }

            if let Some(path) = set_store {
                println!("✔ 保存先を {} に設定しました", path.display());
                config.store_path = Some(path);
                changed = true;
            }

            if let Some(unit) = add_unit {
                if config.add_unit(&unit) {
                    println!("✔ 単位「{}」を追加しました", unit);
                    changed = true;
                } else {
                    println!("- 単位「{}」は登録済みです", unit);
                }
            }

            if let Some(provider) = set_provider {
                config.ai_provider = provider;
                println!("✔ AIプロバイダを {} に設定しました", provider);
                changed = true;
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  AIプロバイダ: {}", config.ai_provider);
                println!("  モデル: {}", config.model.as_deref().unwrap_or("(既定)"));
                println!("  類似判定の閾値: {}", config.fuzzy_threshold);
                println!("  追加単位: {}", if config.extra_units.is_empty() { "(なし)".to_string() } else { config.extra_units.join(", ") });
                println!("  保存先: {}", config.resolve_store_path().display());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(path: &Path) -> anyhow::Result<JsonRepository> {
    JsonRepository::open(path).with_context(|| format!("保存ファイルを開けません: {}", path.display()))
}

fn build_orchestrator(config: &Config, provider: AiProvider) -> ImportOrchestrator {
    let settings = CliSettings {
        provider,
        model: config.model.clone(),
        timeout: config.timeout(),
    };

    ImportOrchestrator::new(
        Arc::new(CliTextExtractor::new(settings.clone())),
        Arc::new(CliStructurer::new(settings)),
        config.validation_options(),
    )
}

/// 種類に応じて抽出経由かテキスト直接かを振り分ける
async fn import_source(
    orchestrator: &ImportOrchestrator,
    source: &scanner::SourceFile,
    catalog: &[CatalogEntry],
) -> recipe_import_rust::Result<Recipe> {
    if source.needs_extraction() {
        let bar = ProgressBarSink::new(&source.file_name);
        return orchestrator
            .import_from_image_with(&source.image_input(), catalog, Some(&bar as &dyn ProgressSink))
            .await;
    }

    let text = match source.kind {
        SourceKind::Excel => scanner::read_excel_text(&source.path)?,
        _ => std::fs::read_to_string(&source.path)?,
    };

    let bar = ProgressBarSink::new(&source.file_name);
    orchestrator
        .import_from_text_with(&text, source_of(source), catalog, Some(&bar as &dyn ProgressSink))
        .await
}

fn source_of(source: &scanner::SourceFile) -> RecipeSource {
    RecipeSource {
        kind: source.kind,
        origin: Some(source.file_name.clone()),
        quality_score: None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn recipe_line(recipe: &Recipe) -> String {
    let mark = match recipe.status {
        RecipeStatus::ReadyToImport => "✔",
        RecipeStatus::NeedsReview => "⚠",
        RecipeStatus::ImportFailed => "✖",
        RecipeStatus::Draft => "-",
    };
    format!(
        "{} {} ({}, 信頼度 {}, 問題 {}件)",
        mark,
        recipe.name,
        recipe.status,
        recipe.confidence,
        recipe.issues.len()
    )
}
