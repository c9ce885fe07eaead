//! レスポンスパーサー
//!
//! AI CLIなどのレスポンスからJSONを抽出し、
//! 構造化結果（レシピ下書き）と文字抽出結果をパースする。
//! 材料行テキストの数量・単位・名前への分解もここで行う。

use crate::error::{Error, Result};
use crate::types::{Confidence, DraftRecipe, RawIngredientLine};
use crate::units::Unit;
use regex::Regex;
use serde::Deserialize;

/// レスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. JSONとして読める最初の {...} オブジェクト（無ければ [...] 配列）
/// 3. 最初の括弧から最後の閉じ括弧まで
/// 4. エラー
///
/// # Examples
/// ```
/// use recipe_import_common::extract_json;
///
/// let response = "結果: {\"name\": \"Pancakes\"} 以上";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"name\": \"Pancakes\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // オブジェクトを優先し、無ければ配列。前置きの括弧書きは読み飛ばす
    for opener in ['{', '['] {
        if let Some(json) = first_parsable(response, opener) {
            return Ok(json);
        }
    }

    // 読めるものが無ければ最初の括弧から対応する閉じ括弧まで（パース側でエラーにする）
    if let Some(start) = response.find(['{', '[']) {
        let closing = if response[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = response.rfind(closing) {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// opener で始まりJSONとして読める最初の値
fn first_parsable(response: &str, opener: char) -> Option<&str> {
    response.match_indices(opener).find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&response[start..])
            .into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(_)) => Some(&response[start..start + stream.byte_offset()]),
            _ => None,
        }
    })
}

/// 文字抽出の結果
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedText {
    pub text: String,
    /// 抽出品質(0-1)
    pub quality_score: f64,
}

/// 文字抽出レスポンスをパース
pub fn parse_extraction_response(response: &str) -> Result<ExtractedText> {
    let json_str = extract_json(response)?;
    let mut extracted: ExtractedText = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("文字抽出 JSONパースエラー: {}", e)))?;
    extracted.quality_score = extracted.quality_score.clamp(0.0, 1.0);
    Ok(extracted)
}

/// 構造化サービスのレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ingredients: Vec<IngredientPayload>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// 材料は文字列でもオブジェクトでも受け付ける
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientPayload {
    Text(String),
    Fields(IngredientFields),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IngredientFields {
    text: String,
    quantity: Option<f64>,
    unit: Option<String>,
    name: String,
}

/// 構造化レスポンスをパースしてレシピ下書きを返す
///
/// 材料が1件も無い場合は解析不能として扱う。
pub fn parse_structurer_response(response: &str) -> Result<DraftRecipe> {
    let json_str = extract_json(response)?;
    let payload: StructuredPayload = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("構造化 JSONパースエラー: {}", e)))?;

    let ingredients: Vec<RawIngredientLine> = payload
        .ingredients
        .into_iter()
        .map(into_line)
        .filter(|line| !line.name.is_empty() || !line.text.is_empty())
        .collect();

    if ingredients.is_empty() {
        return Err(Error::Parse("材料が見つかりません".into()));
    }

    Ok(DraftRecipe {
        name: payload.name.trim().to_string(),
        ingredients,
        confidence: payload
            .confidence
            .map(Confidence::from_score)
            .unwrap_or_default(),
    })
}

fn into_line(payload: IngredientPayload) -> RawIngredientLine {
    match payload {
        IngredientPayload::Text(text) => parse_ingredient_line(&text),
        IngredientPayload::Fields(fields) if fields.name.trim().is_empty() => {
            parse_ingredient_line(&fields.text)
        }
        IngredientPayload::Fields(fields) => {
            let unit = fields
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty());
            let text = if fields.text.trim().is_empty() {
                compose_text(fields.quantity, unit.as_deref(), fields.name.trim())
            } else {
                fields.text.trim().to_string()
            };
            RawIngredientLine {
                text,
                quantity: fields.quantity,
                unit,
                name: fields.name.trim().to_string(),
            }
        }
    }
}

fn compose_text(quantity: Option<f64>, unit: Option<&str>, name: &str) -> String {
    let mut parts = Vec::new();
    if let Some(q) = quantity {
        parts.push(q.to_string());
    }
    if let Some(u) = unit {
        parts.push(u.to_string());
    }
    parts.push(name.to_string());
    parts.join(" ")
}

lazy_static::lazy_static! {
    // 先頭の数量（帯分数・分数・小数・Unicode分数、範囲は下限を採用）
    static ref QUANTITY_RE: Regex = Regex::new(
        r"^(?:(\d+)\s+(\d+)/(\d+)|(\d+)/(\d+)|(\d+(?:\.\d+)?)\s*([½⅓⅔¼¾⅛])?|([½⅓⅔¼¾⅛]))(?:\s*(?:-|–|to)\s*[\d./½⅓⅔¼¾⅛]+)?\s*"
    ).unwrap();
    // 括弧書きの補足
    static ref PAREN_RE: Regex = Regex::new(r"\([^)]*\)").unwrap();
}

/// 材料行テキストを数量・単位・名前に分解
///
/// 単位は語彙にあるものだけを単位として扱い、それ以外は名前の一部とする。
pub fn parse_ingredient_line(text: &str) -> RawIngredientLine {
    let trimmed = text.trim();
    let (quantity, rest) = split_quantity(trimmed);
    let (unit, name) = split_unit(rest);

    RawIngredientLine {
        text: trimmed.to_string(),
        quantity,
        unit,
        name: clean_name(name),
    }
}

fn split_quantity(text: &str) -> (Option<f64>, &str) {
    let Some(caps) = QUANTITY_RE.captures(text) else {
        return (None, text);
    };
    let matched = caps.get(0).map(|m| m.end()).unwrap_or(0);
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

    let value = if let (Some(whole), Some(num), Some(den)) = (number(1), number(2), number(3)) {
        fraction(num, den).map(|f| whole + f)
    } else if let (Some(num), Some(den)) = (number(4), number(5)) {
        fraction(num, den)
    } else if let Some(n) = number(6) {
        let extra = caps.get(7).and_then(|m| vulgar_fraction(m.as_str())).unwrap_or(0.0);
        Some(n + extra)
    } else {
        caps.get(8).and_then(|m| vulgar_fraction(m.as_str()))
    };

    match value {
        Some(v) => (Some(v), &text[matched..]),
        None => (None, text),
    }
}

fn fraction(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn vulgar_fraction(s: &str) -> Option<f64> {
    match s {
        "½" => Some(0.5),
        "⅓" => Some(1.0 / 3.0),
        "⅔" => Some(2.0 / 3.0),
        "¼" => Some(0.25),
        "¾" => Some(0.75),
        "⅛" => Some(0.125),
        _ => None,
    }
}

fn split_unit(text: &str) -> (Option<String>, &str) {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    // "fl oz" のような2語の単位を先に試す
    for width in [2, 1] {
        if tokens.len() <= width {
            continue;
        }
        let candidate = tokens[..width].join(" ");
        if Unit::parse(&candidate).is_some() {
            let rest = skip_tokens(text, width);
            return (Some(candidate), rest);
        }
    }

    (None, text)
}

/// 先頭から n 語を読み飛ばした残り
fn skip_tokens(text: &str, n: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

fn clean_name(name: &str) -> String {
    let without_parens = PAREN_RE.replace_all(name, " ");
    let head = without_parens.split(',').next().unwrap_or_default();
    let head = head.trim();
    let head = head.strip_prefix("of ").unwrap_or(head);
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}
