//! Recipe Import Common Library
//!
//! レシピ取込パイプラインの同期処理部分（照合・検証・スコアリング）と共有型

pub mod types;
pub mod error;
pub mod units;
pub mod catalog;
pub mod matcher;
pub mod validator;
pub mod scorer;
pub mod status;
pub mod parser;
pub mod prompts;

pub use types::{
    CatalogEntry, Confidence, DraftRecipe, Issue, IssueKind, MatchKind, MenuItem,
    MenuRecipeStatus, RawIngredientLine, Recipe, RecipeSource, RecipeStatus, RecipeSummary,
    ResolvedIngredient, SourceKind,
};
pub use error::{Error, Result};
pub use catalog::CatalogIndex;
pub use matcher::{match_ingredient, MatchOutcome, DEFAULT_FUZZY_THRESHOLD};
pub use validator::{validate_ingredients, ValidationOptions, ValidationOutcome};
pub use scorer::score;
pub use status::resolve_status;
pub use parser::{
    extract_json, parse_extraction_response, parse_ingredient_line, parse_structurer_response,
    ExtractedText,
};
pub use prompts::{build_extraction_prompt, build_structure_prompt};
