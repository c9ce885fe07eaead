use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("no text found: 抽出したテキストが空です")]
    ExtractionEmpty,

    #[error("文字抽出エラー: {0}")]
    Extraction(String),

    #[error("構造化に失敗: {0}")]
    StructuringFailed(String),

    #[error("リポジトリエラー: {0}")]
    Repository(String),

    #[error("メニュー紐付けに失敗 (recipe {recipe_id}): {reason}")]
    ReconcileItemFailed { recipe_id: String, reason: String },

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("対応していない形式です: {0}")]
    UnsupportedSource(String),

    #[error("Excel読み込みエラー: {0}")]
    ExcelRead(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] recipe_import_common::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
