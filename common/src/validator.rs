//! レシピ検証モジュール
//!
//! 材料をカタログと照合し直し、問題の一覧を生成する。
//!
//! ## 処理フロー
//! 1. 材料ごと（元の並び順）: 数量・単位・照合結果をチェック
//! 2. レシピ全体: 同じカタログエントリへの重複をチェック（末尾に追加）
//!
//! 検証は純粋関数で、同じレシピ・同じカタログなら常に同じ問題一覧を返す。

use crate::catalog::CatalogIndex;
use crate::matcher::{resolve, DEFAULT_FUZZY_THRESHOLD};
use crate::types::{Issue, IssueKind, MatchKind, ResolvedIngredient};
use crate::units::is_recognized;
use std::collections::HashMap;

/// 検証オプション
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// あいまい照合の閾値（0.0-1.0）
    pub fuzzy_threshold: f64,
    /// 語彙に追加で認める単位
    pub extra_units: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            extra_units: Vec::new(),
        }
    }
}

/// 検証結果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// 照合し直した材料（元の並び順）
    pub ingredients: Vec<ResolvedIngredient>,
    /// 新しい問題一覧（以前の問題は置き換える）
    pub issues: Vec<Issue>,
}

/// 材料一覧を検証する
pub fn validate_ingredients(
    ingredients: &[ResolvedIngredient],
    index: &CatalogIndex,
    options: &ValidationOptions,
) -> ValidationOutcome {
    let mut ordered: Vec<&ResolvedIngredient> = ingredients.iter().collect();
    ordered.sort_by_key(|i| i.order_index);

    let resolved: Vec<ResolvedIngredient> = ordered
        .into_iter()
        .map(|i| resolve(i, index, options.fuzzy_threshold))
        .collect();

    let mut issues = Vec::new();
    for ingredient in &resolved {
        issues.extend(check_ingredient(ingredient, options));
    }
    issues.extend(check_duplicates(&resolved, index));

    ValidationOutcome {
        ingredients: resolved,
        issues,
    }
}

/// 材料1件のチェック
fn check_ingredient(ingredient: &ResolvedIngredient, options: &ValidationOptions) -> Vec<Issue> {
    let mut issues = Vec::new();
    let line = &ingredient.line;
    let label = display_label(ingredient);
    let at = Some(ingredient.order_index);

    if line.quantity.is_none() {
        issues.push(Issue {
            kind: IssueKind::QuantityMissing,
            message: format!("「{}」の数量がありません", label),
            suggested_fix: Some("数量を入力してください".to_string()),
            ingredient_index: at,
        });
    }

    match line.unit.as_deref() {
        None => issues.push(Issue {
            kind: IssueKind::UnitUnclear,
            message: format!("「{}」の単位がありません", label),
            suggested_fix: Some("単位を指定してください（例: cup, g, each）".to_string()),
            ingredient_index: at,
        }),
        Some(unit) if !is_recognized(unit, &options.extra_units) => issues.push(Issue {
            kind: IssueKind::UnitUnclear,
            message: format!("「{}」の単位「{}」を認識できません", label, unit),
            suggested_fix: Some("単位を指定してください（例: cup, g, each）".to_string()),
            ingredient_index: at,
        }),
        Some(_) => {}
    }

    match ingredient.match_kind {
        MatchKind::Fuzzy => issues.push(Issue {
            kind: IssueKind::SimilarIngredient,
            message: format!("「{}」はカタログの類似材料と照合されました", label),
            suggested_fix: ingredient
                .matched_name
                .as_ref()
                .map(|name| format!("「{}」を使用", name)),
            ingredient_index: at,
        }),
        MatchKind::None if !ingredient.candidates.is_empty() => issues.push(Issue {
            kind: IssueKind::SimilarIngredient,
            message: format!("「{}」に似た材料が複数あります", label),
            suggested_fix: Some(format!("候補: {}", ingredient.candidates.join(" / "))),
            ingredient_index: at,
        }),
        MatchKind::None => issues.push(Issue {
            kind: IssueKind::IngredientNotFound,
            message: format!("「{}」はカタログに見つかりません", label),
            suggested_fix: Some("カタログに登録するか材料名を修正してください".to_string()),
            ingredient_index: at,
        }),
        MatchKind::Exact | MatchKind::Alias => {}
    }

    issues
}

/// 同じカタログエントリに解決された2件目以降を重複として報告
fn check_duplicates(resolved: &[ResolvedIngredient], index: &CatalogIndex) -> Vec<Issue> {
    let mut first_seen: HashMap<&str, &ResolvedIngredient> = HashMap::new();
    let mut issues = Vec::new();

    for ingredient in resolved {
        let Some(id) = ingredient.catalog_entry_id.as_deref() else {
            continue;
        };
        match first_seen.get(id) {
            Some(first) => {
                let name = index.display_name(id).unwrap_or(id);
                issues.push(Issue {
                    kind: IssueKind::DuplicateIngredient,
                    message: format!(
                        "「{}」は「{}」と同じ材料（{}）です",
                        display_label(ingredient),
                        display_label(first),
                        name
                    ),
                    suggested_fix: Some(format!("「{}」の行を1行にまとめてください", name)),
                    ingredient_index: Some(ingredient.order_index),
                });
            }
            None => {
                first_seen.insert(id, ingredient);
            }
        }
    }

    issues
}

fn display_label(ingredient: &ResolvedIngredient) -> &str {
    ingredient.line.label()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ingredient_line;
    use crate::types::CatalogEntry;

    fn sample_index() -> CatalogIndex {
        CatalogIndex::build(&[
            CatalogEntry::new("c1", "All-Purpose Flour").with_alias("AP Flour"),
            CatalogEntry::new("c2", "Tomato"),
            CatalogEntry::new("c3", "Whole Milk"),
        ])
    }

    fn ingredients(lines: &[&str]) -> Vec<ResolvedIngredient> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| ResolvedIngredient::unresolved(parse_ingredient_line(text), i))
            .collect()
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_alias_line_has_no_issues() {
        let outcome = validate_ingredients(&ingredients(&["2 cups AP Flour"]), &sample_index(), &ValidationOptions::default());

        assert_eq!(outcome.ingredients[0].match_kind, MatchKind::Alias);
        assert!(!outcome.ingredients[0].is_new);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_unknown_ingredient_not_found() {
        let outcome = validate_ingredients(&ingredients(&["1 dash moon dust"]), &sample_index(), &ValidationOptions::default());

        assert_eq!(outcome.ingredients[0].match_kind, MatchKind::None);
        assert!(outcome.ingredients[0].is_new);
        assert_eq!(kinds(&outcome.issues), vec![IssueKind::IngredientNotFound]);
        assert_eq!(outcome.issues[0].ingredient_index, Some(0));
    }

    #[test]
    fn test_missing_quantity_and_unit() {
        let outcome = validate_ingredients(&ingredients(&["tomato"]), &sample_index(), &ValidationOptions::default());
        assert_eq!(kinds(&outcome.issues), vec![IssueKind::QuantityMissing, IssueKind::UnitUnclear]);
    }

    #[test]
    fn test_unrecognized_unit_and_extra_units() {
        let mut list = ingredients(&["1 cup tomato"]);
        list[0].line.unit = Some("hotel pan".to_string());

        let outcome = validate_ingredients(&list, &sample_index(), &ValidationOptions::default());
        assert_eq!(kinds(&outcome.issues), vec![IssueKind::UnitUnclear]);
        assert!(outcome.issues[0].message.contains("hotel pan"));

        let options = ValidationOptions {
            extra_units: vec!["Hotel Pan".to_string()],
            ..Default::default()
        };
        let outcome = validate_ingredients(&list, &sample_index(), &options);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_blank_name_falls_back_to_text() {
        let mut list = ingredients(&["1 dash moon dust"]);
        list[0].line.name = "   ".to_string();

        let outcome = validate_ingredients(&list, &sample_index(), &ValidationOptions::default());
        assert_eq!(kinds(&outcome.issues), vec![IssueKind::IngredientNotFound]);
        assert!(outcome.issues[0].message.contains("「1 dash moon dust」"));
    }

    #[test]
    fn test_fuzzy_suggests_candidate() {
        let outcome = validate_ingredients(&ingredients(&["2 cups tomatoe"]), &sample_index(), &ValidationOptions::default());

        assert_eq!(kinds(&outcome.issues), vec![IssueKind::SimilarIngredient]);
        assert_eq!(outcome.issues[0].suggested_fix.as_deref(), Some("「Tomato」を使用"));
    }

    #[test]
    fn test_ambiguous_is_single_similar_issue() {
        let index = CatalogIndex::build(&[
            CatalogEntry::new("a", "Red Onion"),
            CatalogEntry::new("b", "Red Pepper"),
        ]);
        let options = ValidationOptions {
            fuzzy_threshold: 0.5,
            ..Default::default()
        };

        let outcome = validate_ingredients(&ingredients(&["1 each red"]), &index, &options);
        assert_eq!(kinds(&outcome.issues), vec![IssueKind::SimilarIngredient]);
        assert_eq!(outcome.issues[0].suggested_fix.as_deref(), Some("候補: Red Onion / Red Pepper"));
    }

    #[test]
    fn test_duplicate_appended_last_and_points_at_second() {
        let outcome = validate_ingredients(
            &ingredients(&["2 cups AP Flour", "1 dash moon dust", "1 cup all-purpose flour"]),
            &sample_index(),
            &ValidationOptions::default(),
        );

        assert_eq!(
            kinds(&outcome.issues),
            vec![IssueKind::IngredientNotFound, IssueKind::DuplicateIngredient]
        );
        assert_eq!(outcome.issues[1].ingredient_index, Some(2));
    }

    #[test]
    fn test_source_order_preserved() {
        let mut list = ingredients(&["1 cup milk", "salt"]);
        list.reverse();

        let outcome = validate_ingredients(&list, &sample_index(), &ValidationOptions::default());
        assert_eq!(outcome.ingredients[0].order_index, 0);
        assert_eq!(outcome.ingredients[1].order_index, 1);
        assert!(outcome.issues.iter().all(|i| i.ingredient_index.is_some()));
        assert_eq!(outcome.issues[0].ingredient_index, Some(0));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let list = ingredients(&["2 cups AP Flour", "tomatoe", "1 dash moon dust"]);
        let index = sample_index();
        let options = ValidationOptions::default();

        let first = validate_ingredients(&list, &index, &options);
        let second = validate_ingredients(&first.ingredients, &index, &options);
        assert_eq!(first, second);
    }
}
