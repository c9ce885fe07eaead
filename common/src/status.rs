//! ステータス判定
//!
//! 問題一覧だけからレシピのステータスを決める。
//! draft は検証前の初期値、import_failed は取込処理の失敗時のみで、ここでは返さない。

use crate::types::{Issue, RecipeStatus};

/// 問題が無ければ ready_to_import、あれば needs_review
pub fn resolve_status(issues: &[Issue]) -> RecipeStatus {
    if issues.is_empty() {
        RecipeStatus::ReadyToImport
    } else {
        RecipeStatus::NeedsReview
    }
}
