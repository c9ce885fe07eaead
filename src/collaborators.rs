//! 外部サービスとの境界
//!
//! 文字抽出と構造化はAI CLIなど外部に委ねるため、traitとして差し替え可能にしている。

use crate::error::Result;
use async_trait::async_trait;
use recipe_import_common::{CatalogEntry, DraftRecipe, ExtractedText, SourceKind};
use std::path::{Path, PathBuf};

/// 文字抽出対象（写真・PDF）
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: SourceKind,
}

impl ImageInput {
    pub fn new(path: &Path, kind: SourceKind) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            file_name,
            kind,
        }
    }
}

/// 画像/PDFから文字を抽出するサービス
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, image: &ImageInput) -> Result<ExtractedText>;
}

/// レシピ本文を下書きに構造化するサービス
///
/// `catalog_hint` は材料名をカタログ表記に寄せるためのヒントで、照合には使わない。
#[async_trait]
pub trait Structurer: Send + Sync {
    async fn structure(&self, raw_text: &str, catalog_hint: &[CatalogEntry]) -> Result<DraftRecipe>;
}
