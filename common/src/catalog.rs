//! カタログインデックスモジュール
//!
//! POS材料カタログ（正式名称＋エイリアス）から照合用のインデックスを構築する。
//! カタログ本体は外部リポジトリが所有し、インデックスはカタログ変更のたびに
//! 作り直す使い捨てのキャッシュ。

use crate::types::CatalogEntry;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// インデックス上の名前の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Canonical,
    Alias,
}

/// あいまい照合で走査する名前
#[derive(Debug, Clone)]
pub struct IndexedName {
    /// 正規化済みの名前
    pub normalized: String,
    /// 正規化済みトークン集合
    pub tokens: BTreeSet<String>,
    pub entry_id: String,
    pub kind: NameKind,
}

/// カタログインデックス
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    /// 正規化した正式名称 → エントリID
    canonical: HashMap<String, String>,
    /// 正規化したエイリアス → エントリID
    aliases: HashMap<String, String>,
    /// あいまい照合用の名前一覧（normalized, entry_id 順）
    names: Vec<IndexedName>,
    /// エントリID → エントリ
    entries: HashMap<String, CatalogEntry>,
}

impl CatalogIndex {
    /// カタログ全体からインデックスを構築
    ///
    /// 非アクティブなエントリは照合対象にしない。
    /// 同じ名前が複数のエントリに登録されている場合はID順で先のエントリを採用する。
    pub fn build(catalog: &[CatalogEntry]) -> Self {
        let mut active: Vec<&CatalogEntry> = catalog.iter().filter(|e| e.is_active).collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = Self::default();

        // 正式名称を先に登録（エイリアスより優先）
        for entry in &active {
            let key = normalize_name(&entry.canonical_name);
            if key.is_empty() {
                continue;
            }
            match index.canonical.get(&key) {
                Some(existing) if existing != &entry.id => {
                    warn!(name = %key, kept = %existing, dropped = %entry.id, "正式名称が重複しています");
                }
                Some(_) => {}
                None => {
                    index.canonical.insert(key, entry.id.clone());
                }
            }
        }

        for entry in &active {
            for alias in &entry.aliases {
                let key = normalize_name(alias);
                if key.is_empty() || index.canonical.contains_key(&key) {
                    continue;
                }
                match index.aliases.get(&key) {
                    Some(existing) if existing != &entry.id => {
                        warn!(alias = %key, kept = %existing, dropped = %entry.id, "エイリアスが重複しています");
                    }
                    Some(_) => {}
                    None => {
                        index.aliases.insert(key, entry.id.clone());
                    }
                }
            }
        }

        let mut names: Vec<IndexedName> = index
            .canonical
            .iter()
            .map(|(k, id)| (k, id, NameKind::Canonical))
            .chain(index.aliases.iter().map(|(k, id)| (k, id, NameKind::Alias)))
            .map(|(normalized, entry_id, kind)| IndexedName {
                tokens: tokenize(normalized),
                normalized: normalized.clone(),
                entry_id: entry_id.clone(),
                kind,
            })
            .collect();
        names.sort_by(|a, b| {
            a.normalized
                .cmp(&b.normalized)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        index.names = names;

        index.entries = active
            .into_iter()
            .map(|e| (e.id.clone(), e.clone()))
            .collect();

        index
    }

    /// 正式名称で検索（正規化済みの名前を渡す）
    pub fn lookup_canonical(&self, normalized: &str) -> Option<&str> {
        lookup_with_singular(&self.canonical, normalized)
    }

    /// エイリアスで検索（正規化済みの名前を渡す）
    pub fn lookup_alias(&self, normalized: &str) -> Option<&str> {
        lookup_with_singular(&self.aliases, normalized)
    }

    /// あいまい照合用の名前一覧
    pub fn names(&self) -> &[IndexedName] {
        &self.names
    }

    /// IDからエントリを取得
    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// 表示用の正式名称
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.canonical_name.as_str())
    }

    /// 照合対象エントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 完全一致を優先し、無ければ単数形が存在する場合のみ複数形の語尾を外して再検索
fn lookup_with_singular<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    if let Some(id) = map.get(key) {
        return Some(id.as_str());
    }

    for suffix in ["es", "s"] {
        if let Some(stem) = key.strip_suffix(suffix) {
            if stem.is_empty() {
                continue;
            }
            if let Some(id) = map.get(stem) {
                return Some(id.as_str());
            }
        }
    }

    None
}

/// 名前を正規化（小文字化・前後空白除去・連続空白の圧縮）
pub fn normalize_name(name: &str) -> String {
    name.replace('　', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 正規化済みの名前をトークン集合に分割
pub fn tokenize(normalized: &str) -> BTreeSet<String> {
    normalized
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | '/' | '(' | ')'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
