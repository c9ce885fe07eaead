use crate::error::{ImportError, Result};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;

/// 最初のシートをタブ区切りテキストにする（空行は除く）
pub fn read_excel_text(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ImportError::ExcelRead(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::ExcelRead(format!("{}: シートがありません", path.display())))?
        .map_err(|e| ImportError::ExcelRead(format!("{}: {}", path.display(), e)))?;

    let lines: Vec<String> = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect::<Vec<_>>()
                .join("\t")
                .trim_end()
                .to_string()
        })
        .filter(|line| !line.trim().is_empty())
        .collect();

    Ok(lines.join("\n"))
}
