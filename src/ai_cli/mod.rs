//! AI CLI連携モジュール
//!
//! 文字抽出・構造化をclaude/codex/gemini CLIに委ねる実装。
//! プロンプト生成とレスポンス解析は recipe_import_common を使用。

mod runner;

pub use runner::run_ai_cli;

use crate::ai_provider::AiProvider;
use crate::collaborators::{ImageInput, Structurer, TextExtractor};
use crate::error::{ImportError, Result};
use async_trait::async_trait;
use recipe_import_common::{
    build_extraction_prompt, build_structure_prompt, parse_extraction_response,
    parse_structurer_response, CatalogEntry, DraftRecipe, ExtractedText,
};
use std::time::Duration;

/// AI CLI呼び出しの共通設定
#[derive(Debug, Clone)]
pub struct CliSettings {
    pub provider: AiProvider,
    pub model: Option<String>,
    pub timeout: Duration,
}

pub struct CliTextExtractor {
    settings: CliSettings,
}

impl CliTextExtractor {
    pub fn new(settings: CliSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TextExtractor for CliTextExtractor {
    async fn extract(&self, image: &ImageInput) -> Result<ExtractedText> {
        let abs_path = std::fs::canonicalize(&image.path)
            .map_err(|_| ImportError::FileNotFound(image.path.display().to_string()))?;

        let prompt = format!(
            "Read the following file and transcribe it: {}\n\n{}",
            abs_path.display().to_string().replace('\\', "/"),
            build_extraction_prompt(&image.file_name)
        );

        let response = run_ai_cli(
            self.settings.provider,
            self.settings.model.as_deref(),
            &prompt,
            self.settings.timeout,
        )
        .await?;

        parse_extraction(&response)
    }
}

pub struct CliStructurer {
    settings: CliSettings,
}

impl CliStructurer {
    pub fn new(settings: CliSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Structurer for CliStructurer {
    async fn structure(&self, raw_text: &str, catalog_hint: &[CatalogEntry]) -> Result<DraftRecipe> {
        let prompt = build_structure_prompt(raw_text, catalog_hint);

        let response = run_ai_cli(
            self.settings.provider,
            self.settings.model.as_deref(),
            &prompt,
            self.settings.timeout,
        )
        .await?;

        parse_structure(&response)
    }
}

/// 抽出レスポンスをパース（共通パーサーをラップ）
fn parse_extraction(response: &str) -> Result<ExtractedText> {
    parse_extraction_response(response)
        .map_err(|e| ImportError::Extraction(format!("抽出結果のJSONパースエラー: {}", e)))
}

/// 構造化レスポンスをパース（共通パーサーをラップ）
fn parse_structure(response: &str) -> Result<DraftRecipe> {
    parse_structurer_response(response)
        .map_err(|e| ImportError::StructuringFailed(format!("構造化結果のパースエラー: {}", e)))
}
