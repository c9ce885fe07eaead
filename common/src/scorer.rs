//! 信頼度スコアリング
//!
//! 検証で得た問題一覧から信頼度ティアを決める。
//! 判定は問題の種類と件数のみで決まり、乱数や外部推定値は使わない。
//!
//! | ティア | 条件 |
//! |--------|------|
//! | high   | 問題なし |
//! | low    | ingredient_not_found を含む、または問題数が n/2+1 件を超える（n は材料数） |
//! | medium | それ以外（軽微な問題のみ） |
//!
//! 件数の境界はちょうど n/2+1 件なら medium、n/2+2 件から low。
//! 例: 材料10件なら6件で medium、7件で low。材料1件なら2件まで medium。

use crate::types::{Confidence, Issue};

/// 過半数（n/2 + 1）
fn majority(count: usize) -> usize {
    count / 2 + 1
}

/// 問題一覧と材料数から信頼度を計算
///
/// low の条件を medium より先に判定するため、境界は低い方に倒れる。
pub fn score(issues: &[Issue], ingredient_count: usize) -> Confidence {
    if issues.is_empty() {
        return Confidence::High;
    }

    if issues.iter().any(|i| i.kind.is_severe()) || issues.len() > majority(ingredient_count) {
        return Confidence::Low;
    }

    Confidence::Medium
}
