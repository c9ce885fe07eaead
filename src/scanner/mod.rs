mod excel;

pub use excel::read_excel_text;

use crate::collaborators::ImageInput;
use crate::error::{ImportError, Result};
use recipe_import_common::SourceKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: SourceKind,
}

impl SourceFile {
    pub fn image_input(&self) -> ImageInput {
        ImageInput {
            path: self.path.clone(),
            file_name: self.file_name.clone(),
            kind: self.kind,
        }
    }

    /// 抽出サービスを通すかどうか
    pub fn needs_extraction(&self) -> bool {
        matches!(self.kind, SourceKind::Photo | SourceKind::Pdf)
    }
}

/// 拡張子から取込元の種類を判定
pub fn classify(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "txt" | "md" => Some(SourceKind::Text),
        "jpg" | "jpeg" | "png" => Some(SourceKind::Photo),
        "pdf" => Some(SourceKind::Pdf),
        "xlsx" | "xls" | "xlsm" => Some(SourceKind::Excel),
        _ => None,
    }
}

/// ファイル1つ、またはフォルダ内の取込元を列挙（ファイル名順）
pub fn scan_sources(path: &Path, recursive: bool) -> Result<Vec<SourceFile>> {
    if path.is_file() {
        let kind = classify(path)
            .ok_or_else(|| ImportError::UnsupportedSource(path.display().to_string()))?;
        return Ok(vec![source_file(path, kind)]);
    }

    if !path.is_dir() {
        return Err(ImportError::FolderNotFound(path.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut sources: Vec<SourceFile> = WalkDir::new(path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !is_hidden(e.path()))
        .filter_map(|e| classify(e.path()).map(|kind| source_file(e.path(), kind)))
        .collect();

    sources.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(sources)
}

fn source_file(path: &Path, kind: SourceKind) -> SourceFile {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    SourceFile {
        path: path.to_path_buf(),
        file_name,
        kind,
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
