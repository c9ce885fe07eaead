//! 材料照合モジュール
//!
//! 材料行1件をカタログのエントリ0〜1件に解決する。
//!
//! ## 照合順序（最初に当たったものを採用）
//! 1. 正式名称の完全一致 → exact
//! 2. エイリアスの完全一致 → alias
//! 3. 類似度が閾値以上の候補がちょうど1件 → fuzzy（同点複数は none）
//! 4. それ以外 → none（新規材料）

use crate::catalog::{normalize_name, tokenize, CatalogIndex};
use crate::types::{MatchKind, RawIngredientLine, ResolvedIngredient};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// あいまい照合の既定閾値
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// 同点判定の許容誤差
const SCORE_EPSILON: f64 = 1e-9;

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub catalog_entry_id: Option<String>,
    pub match_kind: MatchKind,
    pub is_new: bool,
    /// 照合したエントリの正式名称
    pub matched_name: Option<String>,
    /// 同点で絞り込めなかった候補の正式名称（ソート済み）
    pub candidates: Vec<String>,
}

impl MatchOutcome {
    fn hit(index: &CatalogIndex, id: &str, kind: MatchKind) -> Self {
        Self {
            catalog_entry_id: Some(id.to_string()),
            match_kind: kind,
            is_new: false,
            matched_name: index.display_name(id).map(str::to_string),
            candidates: Vec::new(),
        }
    }

    fn new_ingredient() -> Self {
        Self {
            catalog_entry_id: None,
            match_kind: MatchKind::None,
            is_new: true,
            matched_name: None,
            candidates: Vec::new(),
        }
    }
}

/// 材料行をカタログと照合する
///
/// 同じカタログ・同じ入力なら常に同じ結果を返す。カタログは変更しない。
pub fn match_ingredient(line: &RawIngredientLine, index: &CatalogIndex, threshold: f64) -> MatchOutcome {
    let key = normalize_name(line.label());

    if key.is_empty() {
        return MatchOutcome::new_ingredient();
    }

    if let Some(id) = index.lookup_canonical(&key) {
        debug!(name = %key, entry = %id, "exact");
        return MatchOutcome::hit(index, id, MatchKind::Exact);
    }

    if let Some(id) = index.lookup_alias(&key) {
        debug!(name = %key, entry = %id, "alias");
        return MatchOutcome::hit(index, id, MatchKind::Alias);
    }

    fuzzy_match(&key, index, threshold)
}

/// 照合結果を材料に反映した新しい材料を返す
pub fn resolve(ingredient: &ResolvedIngredient, index: &CatalogIndex, threshold: f64) -> ResolvedIngredient {
    let outcome = match_ingredient(&ingredient.line, index, threshold);
    ResolvedIngredient {
        line: ingredient.line.clone(),
        catalog_entry_id: outcome.catalog_entry_id,
        match_kind: outcome.match_kind,
        is_new: outcome.is_new,
        matched_name: outcome.matched_name,
        candidates: outcome.candidates,
        order_index: ingredient.order_index,
    }
}

fn fuzzy_match(key: &str, index: &CatalogIndex, threshold: f64) -> MatchOutcome {
    let key_tokens = tokenize(key);

    // エントリごとの最高スコア（正式名称とエイリアスの両方が当たっても1候補）
    let mut best_by_entry: BTreeMap<&str, f64> = BTreeMap::new();
    for name in index.names() {
        let score = token_set_similarity(&key_tokens, &name.tokens).max(edit_similarity(key, &name.normalized));
        let best = best_by_entry.entry(name.entry_id.as_str()).or_insert(0.0);
        if score > *best {
            *best = score;
        }
    }

    let top = best_by_entry.values().copied().fold(0.0_f64, f64::max);
    if top < threshold {
        debug!(name = %key, top, "候補なし");
        return MatchOutcome::new_ingredient();
    }

    let tied: Vec<&str> = best_by_entry
        .iter()
        .filter(|(_, score)| (top - **score).abs() < SCORE_EPSILON)
        .map(|(id, _)| *id)
        .collect();

    if let [id] = tied.as_slice() {
        debug!(name = %key, entry = %id, score = top, "fuzzy");
        return MatchOutcome::hit(index, id, MatchKind::Fuzzy);
    }

    let mut candidates: Vec<String> = tied
        .iter()
        .filter_map(|id| index.display_name(id))
        .map(str::to_string)
        .collect();
    candidates.sort();
    debug!(name = %key, ?candidates, "同点の候補が複数");

    MatchOutcome {
        catalog_entry_id: None,
        match_kind: MatchKind::None,
        is_new: false,
        matched_name: None,
        candidates,
    }
}

/// トークン集合の重なり（Jaccard係数）
pub fn token_set_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// 類似度を計算（編集距離ベース）
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(a, b);
    let max_len = a.chars().count().max(b.chars().count());

    1.0 - (distance as f64 / max_len as f64)
}

/// レーベンシュタイン距離を計算
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // 1行分だけ保持
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogEntry;

    fn sample_index() -> CatalogIndex {
        CatalogIndex::build(&[
            CatalogEntry::new("c1", "All-Purpose Flour").with_alias("AP Flour"),
            CatalogEntry::new("c2", "Tomato"),
            CatalogEntry::new("c3", "Whole Milk"),
        ])
    }

    fn line(name: &str) -> RawIngredientLine {
        RawIngredientLine {
            text: name.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_edit_similarity() {
        assert!((edit_similarity("tomato", "tomato") - 1.0).abs() < 0.01);
        assert!(edit_similarity("tomatoe", "tomato") > 0.8);
        assert!(edit_similarity("tomato", "milk") < 0.5);
    }

    #[test]
    fn test_exact_match() {
        let outcome = match_ingredient(&line("all-purpose flour"), &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Exact);
        assert_eq!(outcome.catalog_entry_id.as_deref(), Some("c1"));
        assert!(!outcome.is_new);
    }

    #[test]
    fn test_alias_match() {
        let outcome = match_ingredient(&line("AP Flour"), &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Alias);
        assert_eq!(outcome.catalog_entry_id.as_deref(), Some("c1"));
        assert_eq!(outcome.matched_name.as_deref(), Some("All-Purpose Flour"));
        assert!(!outcome.is_new);
    }

    #[test]
    fn test_fuzzy_match() {
        let outcome = match_ingredient(&line("tomatoe"), &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Fuzzy);
        assert_eq!(outcome.catalog_entry_id.as_deref(), Some("c2"));
        assert_eq!(outcome.matched_name.as_deref(), Some("Tomato"));
    }

    #[test]
    fn test_fuzzy_by_token_overlap() {
        let outcome = match_ingredient(&line("all purpose flour"), &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Fuzzy);
        assert_eq!(outcome.catalog_entry_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_no_match_is_new() {
        let outcome = match_ingredient(&line("moon dust"), &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::None);
        assert!(outcome.catalog_entry_id.is_none());
        assert!(outcome.is_new);
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let index = CatalogIndex::build(&[
            CatalogEntry::new("a", "Red Onion"),
            CatalogEntry::new("b", "Red Pepper"),
        ]);

        // どちらともトークン重なり 1/2
        let outcome = match_ingredient(&line("red"), &index, 0.5);
        assert_eq!(outcome.match_kind, MatchKind::None);
        assert!(outcome.catalog_entry_id.is_none());
        assert!(!outcome.is_new);
        assert_eq!(outcome.candidates, vec!["Red Onion".to_string(), "Red Pepper".to_string()]);
    }

    #[test]
    fn test_threshold_configurable() {
        let outcome = match_ingredient(&line("tomatoe"), &sample_index(), 0.95);
        assert_eq!(outcome.match_kind, MatchKind::None);
        assert!(outcome.is_new);
    }

    #[test]
    fn test_deterministic() {
        let index = sample_index();
        let first = match_ingredient(&line("whole milks"), &index, DEFAULT_FUZZY_THRESHOLD);
        for _ in 0..10 {
            assert_eq!(match_ingredient(&line("whole milks"), &index, DEFAULT_FUZZY_THRESHOLD), first);
        }
    }

    #[test]
    fn test_empty_name_falls_back_to_text() {
        let raw = RawIngredientLine {
            text: "Tomato".to_string(),
            ..Default::default()
        };
        let outcome = match_ingredient(&raw, &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Exact);

        let blank = RawIngredientLine {
            text: "Tomato".to_string(),
            name: "  ".to_string(),
            ..Default::default()
        };
        let outcome = match_ingredient(&blank, &sample_index(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(outcome.match_kind, MatchKind::Exact);
    }
}
