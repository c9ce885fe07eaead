//! レシピ取込の型定義
//!
//! CLIと共通ロジックで共有される型:
//! - RawIngredientLine: 構造化サービスが返す材料行（数量・単位・名前に分解済み）
//! - CatalogEntry: POS材料カタログのエントリ
//! - ResolvedIngredient: カタログ照合後の材料
//! - Issue: 検証で検出した問題
//! - Recipe: 最終出力（照合・検証・スコア付け済み）
//! - MenuItem: POSメニュー項目とレシピの紐付け

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 材料行（構造化サービスの出力、生成後は不変）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIngredientLine {
    /// 元のテキスト（例: "2 cups AP flour"）
    pub text: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
}

impl RawIngredientLine {
    /// 照合・表示に使う名前（名前が空白だけなら元のテキスト）
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.text
        } else {
            &self.name
        }
    }
}

/// POS材料カタログのエントリ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogEntry {
    pub id: String,
    pub canonical_name: String,
    pub unit: String,
    pub pack_size: f64,
    pub external_pos_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub aliases: BTreeSet<String>,
}

fn default_active() -> bool {
    true
}

impl CatalogEntry {
    pub fn new(id: &str, canonical_name: &str) -> Self {
        Self {
            id: id.to_string(),
            canonical_name: canonical_name.to_string(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.insert(alias.to_string());
        self
    }
}

/// 照合の種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
    Fuzzy,
    #[default]
    None,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Alias => write!(f, "alias"),
            MatchKind::Fuzzy => write!(f, "fuzzy"),
            MatchKind::None => write!(f, "none"),
        }
    }
}

/// カタログ照合済みの材料
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedIngredient {
    pub line: RawIngredientLine,
    /// None ⇒ 未照合（新規材料）
    pub catalog_entry_id: Option<String>,
    pub match_kind: MatchKind,
    pub is_new: bool,
    /// 照合したカタログ名（fuzzy時は候補名）
    pub matched_name: Option<String>,
    /// 同点で絞り込めなかった候補名
    pub candidates: Vec<String>,
    /// 元の並び順（表示用）
    pub order_index: usize,
}

impl ResolvedIngredient {
    /// 照合前の状態で生成
    pub fn unresolved(line: RawIngredientLine, order_index: usize) -> Self {
        Self {
            line,
            order_index,
            ..Default::default()
        }
    }
}

/// 問題の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnitUnclear,
    IngredientNotFound,
    SimilarIngredient,
    QuantityMissing,
    DuplicateIngredient,
}

impl IssueKind {
    /// 信頼度を即座にlowへ落とす問題か
    pub fn is_severe(&self) -> bool {
        matches!(self, IssueKind::IngredientNotFound)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::UnitUnclear => write!(f, "unit_unclear"),
            IssueKind::IngredientNotFound => write!(f, "ingredient_not_found"),
            IssueKind::SimilarIngredient => write!(f, "similar_ingredient"),
            IssueKind::QuantityMissing => write!(f, "quantity_missing"),
            IssueKind::DuplicateIngredient => write!(f, "duplicate_ingredient"),
        }
    }
}

/// 検証で検出した問題（検証のたびに再生成される派生データ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// 対象材料の order_index（レシピ全体の問題はNone）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_index: Option<usize>,
}

/// 信頼度ティア（Low < Medium < High）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// 構造化サービスの数値信頼度(0-1)をティアに変換
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Confidence::High
        } else if score >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// レシピのライフサイクル状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStatus {
    #[default]
    Draft,
    ReadyToImport,
    NeedsReview,
    ImportFailed,
}

impl fmt::Display for RecipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeStatus::Draft => write!(f, "draft"),
            RecipeStatus::ReadyToImport => write!(f, "ready_to_import"),
            RecipeStatus::NeedsReview => write!(f, "needs_review"),
            RecipeStatus::ImportFailed => write!(f, "import_failed"),
        }
    }
}

/// 取込元の種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Photo,
    Pdf,
    Excel,
    #[default]
    Text,
}

/// 取込元
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeSource {
    pub kind: SourceKind,
    /// ファイル名など
    pub origin: Option<String>,
    /// 文字抽出の品質スコア(0-1)
    pub quality_score: Option<f64>,
}

impl RecipeSource {
    pub fn text(origin: Option<&str>) -> Self {
        Self {
            kind: SourceKind::Text,
            origin: origin.map(str::to_string),
            quality_score: None,
        }
    }
}

/// 構造化サービスの出力: 照合前のレシピ下書き
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftRecipe {
    pub name: String,
    pub ingredients: Vec<RawIngredientLine>,
    /// 検証前に使う信頼度の初期値
    pub confidence: Confidence,
}

/// レシピ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub source: RecipeSource,
    #[serde(default)]
    pub ingredients: Vec<ResolvedIngredient>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub status: RecipeStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Recipe {
    /// 下書きから未検証のレシピを生成
    pub fn from_draft(id: String, draft: DraftRecipe, source: RecipeSource, now: DateTime<Utc>) -> Self {
        let ingredients = draft
            .ingredients
            .into_iter()
            .enumerate()
            .map(|(i, line)| ResolvedIngredient::unresolved(line, i))
            .collect();

        Self {
            id,
            name: draft.name,
            source,
            ingredients,
            issues: Vec::new(),
            confidence: draft.confidence,
            status: RecipeStatus::Draft,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// メニュー紐付け用のレシピ概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
}

/// メニュー項目のレシピ状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuRecipeStatus {
    Mapped,
    NeedsReview,
    #[default]
    Missing,
}

impl MenuRecipeStatus {
    /// 紐付いたレシピ（無ければNone）から状態を導出
    pub fn derive(recipe: Option<&Recipe>) -> Self {
        match recipe {
            None => MenuRecipeStatus::Missing,
            Some(r) if r.status == RecipeStatus::ReadyToImport => MenuRecipeStatus::Mapped,
            Some(_) => MenuRecipeStatus::NeedsReview,
        }
    }
}

impl fmt::Display for MenuRecipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuRecipeStatus::Mapped => write!(f, "mapped"),
            MenuRecipeStatus::NeedsReview => write!(f, "needs_review"),
            MenuRecipeStatus::Missing => write!(f, "missing"),
        }
    }
}

/// POSメニュー項目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub external_pos_id: Option<String>,
    /// 弱参照（レシピを所有しない）
    pub recipe_id: Option<String>,
    pub recipe_status: MenuRecipeStatus,
}
