//! プロンプト生成モジュール
//!
//! AI CLIに渡すプロンプトを生成する:
//! - build_extraction_prompt: 画像/PDFからの文字抽出用
//! - build_structure_prompt: レシピ本文の構造化用（カタログ名をヒントとして渡す）

use crate::types::CatalogEntry;

/// ヒントとして渡すカタログ名の上限
const MAX_CATALOG_HINT: usize = 300;

/// 文字抽出プロンプト生成
pub fn build_extraction_prompt(file_name: &str) -> String {
    format!(
        r#"あなたは厨房のレシピカードを書き起こす担当者です。
ファイル「{file_name}」に写っているレシピの文字をすべて書き起こしてください。

## 出力ルール
1. 材料は1行に1つ、読み取れた通りに書く（数量・単位を勝手に補わない）
2. 読み取れない箇所は省略する
3. qualityScore は読み取りの確かさ（0.0〜1.0）

## 出力形式（JSON）
```json
{{
  "text": "書き起こした全文",
  "qualityScore": 0.0
}}
```

- JSONのみ出力。説明文は不要
"#
    )
}

/// 構造化プロンプト生成
///
/// # Arguments
/// * `raw_text` - 抽出済みまたは入力されたレシピ本文
/// * `catalog` - 現在の材料カタログ（名前を寄せるためのヒント）
pub fn build_structure_prompt(raw_text: &str, catalog: &[CatalogEntry]) -> String {
    let mut names: Vec<&str> = catalog
        .iter()
        .filter(|e| e.is_active)
        .map(|e| e.canonical_name.as_str())
        .collect();
    names.sort();
    names.dedup();
    names.truncate(MAX_CATALOG_HINT);

    let catalog_str = if names.is_empty() {
        "（なし）".to_string()
    } else {
        names.join(", ")
    };

    format!(
        r#"あなたはレストランのレシピを原価管理システムに登録する担当者です。
以下のレシピ本文を構造化してください。

## 既存の材料カタログ
{catalog_str}

## レシピ本文
{raw_text}

## 出力ルール
1. name はレシピ名（不明なら本文から推測）
2. ingredients は本文の順番を保つ
3. quantity は数値、読み取れなければ null
4. unit は本文の表記のまま、無ければ null
5. name はカタログに同じ材料があればカタログの表記に寄せる
6. 本文に無い材料を追加しない
7. confidence は構造化の確かさ（0.0〜1.0）

## 出力形式（JSON）
```json
{{
  "name": "レシピ名",
  "confidence": 0.0,
  "ingredients": [
    {{ "text": "元の行", "quantity": 2, "unit": "cups", "name": "材料名" }}
  ]
}}
```

- JSONのみ出力。説明文は不要
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_extraction_prompt() {
        let prompt = build_extraction_prompt("card.jpg");
        assert!(prompt.contains("card.jpg"));
        assert!(prompt.contains("qualityScore"));
        assert!(prompt.contains("JSONのみ出力"));
    }

    #[test]
    fn test_build_structure_prompt_includes_active_catalog_names() {
        let mut inactive = CatalogEntry::new("c3", "Saffron");
        inactive.is_active = false;
        let catalog = vec![
            CatalogEntry::new("c2", "Tomato"),
            CatalogEntry::new("c1", "All-Purpose Flour"),
            inactive,
        ];

        let prompt = build_structure_prompt("2 cups AP flour", &catalog);
        assert!(prompt.contains("All-Purpose Flour, Tomato"));
        assert!(!prompt.contains("Saffron"));
        assert!(prompt.contains("2 cups AP flour"));
    }

    #[test]
    fn test_build_structure_prompt_empty_catalog() {
        let prompt = build_structure_prompt("1 egg", &[]);
        assert!(prompt.contains("（なし）"));
    }
}
