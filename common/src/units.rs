//! 単位語彙モジュール
//!
//! 材料行の単位が認識できるかを判定する。
//! 単数・複数・略記の表記ゆれを同じ単位として扱う。

/// 認識できる単位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    // 容量
    Teaspoon,
    Tablespoon,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Milliliter,
    Liter,

    // 重量
    Ounce,
    Pound,
    Gram,
    Kilogram,

    // 個数
    Each,
    Dozen,
    Clove,
    Slice,
    Bunch,
    Can,
    Package,
    Bottle,

    // 少量
    Pinch,
    Dash,
}

impl Unit {
    /// 表記から単位を取得（大文字小文字・末尾ピリオドを無視）
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().trim_end_matches('.').to_lowercase();
        let unit = match lower.as_str() {
            "tsp" | "tsps" | "teaspoon" | "teaspoons" | "t" => Unit::Teaspoon,
            "tbsp" | "tbsps" | "tbs" | "tablespoon" | "tablespoons" => Unit::Tablespoon,
            "fl oz" | "floz" | "fluid ounce" | "fluid ounces" => Unit::FluidOunce,
            "cup" | "cups" | "c" => Unit::Cup,
            "pint" | "pints" | "pt" => Unit::Pint,
            "quart" | "quarts" | "qt" => Unit::Quart,
            "gallon" | "gallons" | "gal" => Unit::Gallon,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Unit::Milliliter,
            "l" | "liter" | "liters" | "litre" | "litres" => Unit::Liter,
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "g" | "gram" | "grams" | "gr" => Unit::Gram,
            "kg" | "kilogram" | "kilograms" | "kilo" | "kilos" => Unit::Kilogram,
            "ea" | "each" | "piece" | "pieces" | "pc" | "pcs" | "whole" => Unit::Each,
            "dozen" | "doz" => Unit::Dozen,
            "clove" | "cloves" => Unit::Clove,
            "slice" | "slices" => Unit::Slice,
            "bunch" | "bunches" => Unit::Bunch,
            "can" | "cans" | "tin" | "tins" => Unit::Can,
            "package" | "packages" | "pkg" | "pack" | "packs" => Unit::Package,
            "bottle" | "bottles" => Unit::Bottle,
            "pinch" | "pinches" => Unit::Pinch,
            "dash" | "dashes" => Unit::Dash,
            _ => return None,
        };
        Some(unit)
    }

    /// 表示用の略記
    pub fn display_name(&self) -> &'static str {
        match self {
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::FluidOunce => "fl oz",
            Unit::Cup => "cup",
            Unit::Pint => "pint",
            Unit::Quart => "quart",
            Unit::Gallon => "gallon",
            Unit::Milliliter => "ml",
            Unit::Liter => "L",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Each => "each",
            Unit::Dozen => "dozen",
            Unit::Clove => "clove",
            Unit::Slice => "slice",
            Unit::Bunch => "bunch",
            Unit::Can => "can",
            Unit::Package => "package",
            Unit::Bottle => "bottle",
            Unit::Pinch => "pinch",
            Unit::Dash => "dash",
        }
    }

    /// 容量単位か
    pub fn is_volume(&self) -> bool {
        matches!(
            self,
            Unit::Teaspoon
                | Unit::Tablespoon
                | Unit::FluidOunce
                | Unit::Cup
                | Unit::Pint
                | Unit::Quart
                | Unit::Gallon
                | Unit::Milliliter
                | Unit::Liter
        )
    }

    /// 重量単位か
    pub fn is_weight(&self) -> bool {
        matches!(self, Unit::Ounce | Unit::Pound | Unit::Gram | Unit::Kilogram)
    }
}

/// 単位が語彙に含まれるか（設定で追加した単位も含む）
pub fn is_recognized(unit: &str, extra_units: &[String]) -> bool {
    if Unit::parse(unit).is_some() {
        return true;
    }
    let lower = unit.trim().to_lowercase();
    !lower.is_empty() && extra_units.iter().any(|u| u.trim().to_lowercase() == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spellings() {
        assert_eq!(Unit::parse("cups"), Some(Unit::Cup));
        assert_eq!(Unit::parse("Cup"), Some(Unit::Cup));
        assert_eq!(Unit::parse("tbsp."), Some(Unit::Tablespoon));
        assert_eq!(Unit::parse("LBS"), Some(Unit::Pound));
        assert_eq!(Unit::parse("dash"), Some(Unit::Dash));
        assert_eq!(Unit::parse("handful"), None);
        assert_eq!(Unit::parse(""), None);
    }

    #[test]
    fn test_unit_categories() {
        assert!(Unit::Cup.is_volume());
        assert!(!Unit::Cup.is_weight());
        assert!(Unit::Gram.is_weight());
        assert!(!Unit::Each.is_volume());
    }

    #[test]
    fn test_is_recognized_with_extra_units() {
        let extra = vec!["Hotel Pan".to_string()];
        assert!(is_recognized("cups", &extra));
        assert!(is_recognized("hotel pan", &extra));
        assert!(!is_recognized("handful", &extra));
        assert!(!is_recognized("  ", &extra));
    }
}
