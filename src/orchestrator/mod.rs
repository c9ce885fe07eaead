//! 取込パイプライン
//!
//! start → extracting（画像のみ） → structuring → validating → done。
//! どの段階で失敗しても failed を通知してエラーを呼び出し側へ返す。
//! リポジトリへの保存は呼び出し側が行い、ここでは一切書き込まない。

mod progress;

pub use progress::{
    ChannelSink, ImportStage, ProgressBarSink, ProgressEvent, ProgressSink, RecordingSink,
};

use crate::collaborators::{ImageInput, Structurer, TextExtractor};
use crate::error::{ImportError, Result};
use chrono::Utc;
use progress::ProgressReporter;
use recipe_import_common::{
    resolve_status, score, validate_ingredients, CatalogEntry, CatalogIndex, Confidence, Recipe,
    RecipeSource, RecipeStatus, SourceKind, ValidationOptions,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ImportOrchestrator {
    extractor: Arc<dyn TextExtractor>,
    structurer: Arc<dyn Structurer>,
    options: ValidationOptions,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ImportOrchestrator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        structurer: Arc<dyn Structurer>,
        options: ValidationOptions,
    ) -> Self {
        Self {
            extractor,
            structurer,
            options,
            sink: None,
        }
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// 写真・PDFから取込
    pub async fn import_from_image(
        &self,
        image: &ImageInput,
        catalog: &[CatalogEntry],
    ) -> Result<Recipe> {
        self.import_from_image_with(image, catalog, self.sink.as_deref()).await
    }

    /// 取込1回ぶんだけ別の通知先を使う
    pub async fn import_from_image_with(
        &self,
        image: &ImageInput,
        catalog: &[CatalogEntry],
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Recipe> {
        let mut progress = ProgressReporter::new(sink);
        progress.advance(ImportStage::Start, format!("{} の取込を開始", image.file_name));

        let result = self.run_image(image, catalog, &mut progress).await;
        conclude(result, &mut progress)
    }

    /// 入力済みテキストから取込（抽出段階は飛ばす）
    pub async fn import_from_text(
        &self,
        text: &str,
        source: RecipeSource,
        catalog: &[CatalogEntry],
    ) -> Result<Recipe> {
        self.import_from_text_with(text, source, catalog, self.sink.as_deref()).await
    }

    pub async fn import_from_text_with(
        &self,
        text: &str,
        source: RecipeSource,
        catalog: &[CatalogEntry],
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Recipe> {
        let mut progress = ProgressReporter::new(sink);
        progress.advance(ImportStage::Start, "テキストの取込を開始");

        let result = self.structure_and_validate(text, source, catalog, &mut progress).await;
        conclude(result, &mut progress)
    }

    /// カタログ変更後の再検証（validating段階のみ）
    ///
    /// 問題一覧は毎回作り直す。取込失敗の記録は材料を持たないのでそのまま返す。
    pub fn revalidate(&self, recipe: &Recipe, catalog: &[CatalogEntry]) -> Recipe {
        if recipe.status == RecipeStatus::ImportFailed {
            debug!(recipe_id = %recipe.id, "取込失敗のレシピは再検証しない");
            return recipe.clone();
        }
        let index = CatalogIndex::build(catalog);
        self.validate(recipe.clone(), &index)
    }

    /// 取込失敗の記録を作る（保存するかは呼び出し側が決める）
    pub fn failure_record(&self, name: &str, source: RecipeSource) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            source,
            ingredients: Vec::new(),
            issues: Vec::new(),
            confidence: Confidence::Low,
            status: RecipeStatus::ImportFailed,
            created_at: now,
            last_updated: now,
        }
    }

    async fn run_image(
        &self,
        image: &ImageInput,
        catalog: &[CatalogEntry],
        progress: &mut ProgressReporter<'_>,
    ) -> Result<Recipe> {
        progress.advance(ImportStage::Extracting, "文字を抽出中");

        let extracted = self.extractor.extract(image).await.map_err(into_extraction_error)?;
        if extracted.text.trim().is_empty() {
            return Err(ImportError::ExtractionEmpty);
        }
        info!(
            file = %image.file_name,
            chars = extracted.text.chars().count(),
            quality = extracted.quality_score,
            "文字抽出完了"
        );

        let source = RecipeSource {
            kind: image.kind,
            origin: Some(image.file_name.clone()),
            quality_score: Some(extracted.quality_score),
        };
        self.structure_and_validate(&extracted.text, source, catalog, progress).await
    }

    async fn structure_and_validate(
        &self,
        text: &str,
        source: RecipeSource,
        catalog: &[CatalogEntry],
        progress: &mut ProgressReporter<'_>,
    ) -> Result<Recipe> {
        progress.advance(ImportStage::Structuring, "レシピを構造化中");

        if text.trim().is_empty() {
            return Err(ImportError::ExtractionEmpty);
        }

        // 構造化と検証は同じカタログのスナップショットを使う
        let index = CatalogIndex::build(catalog);

        let draft = self
            .structurer
            .structure(text, catalog)
            .await
            .map_err(into_structuring_error)?;
        if draft.ingredients.is_empty() {
            return Err(ImportError::StructuringFailed("材料が見つかりません".into()));
        }

        let name = if draft.name.trim().is_empty() {
            default_recipe_name(&source)
        } else {
            draft.name.clone()
        };
        let mut recipe = Recipe::from_draft(Uuid::new_v4().to_string(), draft, source, Utc::now());
        recipe.name = name;
        info!(recipe_id = %recipe.id, name = %recipe.name, ingredients = recipe.ingredients.len(), "構造化完了");

        progress.advance(ImportStage::Validating, "材料を照合中");
        Ok(self.validate(recipe, &index))
    }

    /// Validator → Scorer → Status Resolver の順で適用
    fn validate(&self, mut recipe: Recipe, index: &CatalogIndex) -> Recipe {
        let outcome = validate_ingredients(&recipe.ingredients, index, &self.options);

        recipe.confidence = score(&outcome.issues, outcome.ingredients.len());
        recipe.status = resolve_status(&outcome.issues);
        recipe.ingredients = outcome.ingredients;
        recipe.issues = outcome.issues;
        recipe.last_updated = Utc::now();

        info!(
            recipe_id = %recipe.id,
            issues = recipe.issues.len(),
            confidence = %recipe.confidence,
            status = %recipe.status,
            "検証完了"
        );
        recipe
    }
}

fn conclude(result: Result<Recipe>, progress: &mut ProgressReporter<'_>) -> Result<Recipe> {
    match &result {
        Ok(recipe) => progress.advance(
            ImportStage::Done,
            format!("{} ({}, {})", recipe.name, recipe.status, recipe.confidence),
        ),
        Err(e) => {
            warn!(error = %e, "取込失敗");
            progress.fail(e);
        }
    }
    result
}

fn default_recipe_name(source: &RecipeSource) -> String {
    source
        .origin
        .as_deref()
        .map(|origin| {
            std::path::Path::new(origin)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| origin.to_string())
        })
        .unwrap_or_else(|| match source.kind {
            SourceKind::Text => "無題のレシピ".to_string(),
            kind => format!("無題のレシピ ({:?})", kind),
        })
}

fn into_extraction_error(error: ImportError) -> ImportError {
    match error {
        e @ (ImportError::Extraction(_) | ImportError::ExtractionEmpty) => e,
        other => ImportError::Extraction(other.to_string()),
    }
}

fn into_structuring_error(error: ImportError) -> ImportError {
    match error {
        e @ ImportError::StructuringFailed(_) => e,
        other => ImportError::StructuringFailed(other.to_string()),
    }
}
