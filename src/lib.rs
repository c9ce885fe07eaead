//! Recipe Import
//!
//! レシピ取込パイプライン（抽出 → 構造化 → 照合・検証）とメニュー紐付け。
//! 照合・検証などの同期処理は recipe_import_common にある。

pub mod ai_cli;
pub mod ai_provider;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reconciler;
pub mod repository;
pub mod scanner;

pub use collaborators::{ImageInput, Structurer, TextExtractor};
pub use error::{ImportError, Result};
pub use orchestrator::{ImportOrchestrator, ImportStage, ProgressEvent, ProgressSink};
pub use reconciler::{MenuLinkReconciler, ReconcileReport};
pub use repository::{JsonRepository, Repository};
