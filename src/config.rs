use crate::ai_provider::AiProvider;
use crate::error::{ImportError, Result};
use recipe_import_common::{ValidationOptions, DEFAULT_FUZZY_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 保存先を上書きする環境変数
pub const STORE_ENV: &str = "RECIPE_IMPORT_STORE";

const DEFAULT_STORE_FILE: &str = "recipe-store.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai_provider: AiProvider,
    pub model: Option<String>,
    pub fuzzy_threshold: f64,
    pub extra_units: Vec<String>,
    pub store_path: Option<PathBuf>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::Claude,
            model: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            extra_units: Vec::new(),
            store_path: None,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.check()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ImportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("recipe-import").join("config.json"))
    }

    /// 保存先の決定（環境変数 > 設定ファイル > カレントの recipe-store.json）
    pub fn resolve_store_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(STORE_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        self.store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            fuzzy_threshold: self.fuzzy_threshold,
            extra_units: self.extra_units.clone(),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        check_threshold(threshold)?;
        self.fuzzy_threshold = threshold;
        Ok(())
    }

    /// 単位を追加（大文字小文字を区別せず重複は無視）
    pub fn add_unit(&mut self, unit: &str) -> bool {
        let unit = unit.trim().to_lowercase();
        if unit.is_empty() || self.extra_units.iter().any(|u| u.to_lowercase() == unit) {
            return false;
        }
        self.extra_units.push(unit);
        true
    }

    fn check(&self) -> Result<()> {
        check_threshold(self.fuzzy_threshold)?;
        if self.timeout_seconds == 0 {
            return Err(ImportError::Config("timeout_seconds は1以上にしてください".into()));
        }
        Ok(())
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) || threshold.is_nan() {
        return Err(ImportError::Config(format!(
            "fuzzy_threshold は0.0〜1.0で指定してください: {}",
            threshold
        )));
    }
    Ok(())
}
