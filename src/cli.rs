use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recipe-import")]
#[command(about = "レシピ取込・POS材料カタログ照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (claude/codex/gemini)。省略時は設定ファイルの値
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,

    /// 保存ファイル（省略時は環境変数 RECIPE_IMPORT_STORE → 設定 → ./recipe-store.json）
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真・PDF・Excel・テキストからレシピを取込
    Import {
        /// ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 取込に失敗したファイルも import_failed として記録
        #[arg(long)]
        record_failures: bool,
    },

    /// 現在のカタログでレシピを再検証
    Revalidate {
        /// レシピID（省略時は全件）
        id: Option<String>,
    },

    /// メニュー項目が無いレシピにメニュー項目を作成
    Reconcile,

    /// 材料カタログの読み込み/表示
    Catalog {
        /// カタログJSONファイル（CatalogEntryの配列）
        #[arg(long)]
        load: Option<PathBuf>,

        /// カタログを表示
        #[arg(long)]
        list: bool,
    },

    /// レシピ一覧を表示
    List {
        /// 問題の詳細も表示
        #[arg(long)]
        issues: bool,
    },

    /// メニュー項目と紐付け状態を表示
    Menu,

    /// 設定を表示/編集
    Config {
        /// 類似判定の閾値（0.0-1.0）
        #[arg(long)]
        set_threshold: Option<f64>,

        /// 保存ファイルのパス
        #[arg(long)]
        set_store: Option<PathBuf>,

        /// 単位を追加
        #[arg(long)]
        add_unit: Option<String>,

        /// 既定のAIプロバイダ
        #[arg(long)]
        set_provider: Option<AiProvider>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
