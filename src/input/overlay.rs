//! Authoritative corrections read from a spreadsheet
//!
//! The first worksheet holds `header_rows` header rows followed by one row per
//! surah: data row 0 is surah 1, data row 113 is surah 114. Rows and the text
//! column are counted from cell A1, whatever part of the sheet is in use.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{
    Data,
    Range,
    Reader,
    open_workbook_auto,
};

use crate::config::OverlayConfig;
use crate::error::PipelineError;
use crate::types::SectionId;

/// Override text per section. Sections with empty cells are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeOverlay {
    values: BTreeMap<SectionId, String>,
}

impl AuthoritativeOverlay {
    /// Builds an overlay from spreadsheet rows, header included.
    ///
    /// `column` is 1-based. Cells are trimmed; empty cells are skipped.
    pub fn from_rows<R, C>(rows: R, header_rows: usize, column: usize) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: ToString,
    {
        let mut values = BTreeMap::new();
        let column_index = column.saturating_sub(1);

        for (index, row) in rows.into_iter().skip(header_rows).enumerate() {
            let Some(section) = SectionId::from_row_index(index) else {
                tracing::warn!(row = index + header_rows + 1, "Ignoring spreadsheet row past the last surah");
                continue;
            };
            let Some(cell) = row.get(column_index) else {
                continue;
            };
            let text = cell.to_string().trim().to_string();
            if !text.is_empty() {
                values.insert(section, text);
            }
        }

        Self { values }
    }

    /// Reads the first worksheet of an `.xlsx`, `.xls` or `.ods` file.
    ///
    /// # Errors
    /// `PipelineError::Spreadsheet` when the workbook cannot be opened or has no sheet.
    pub fn load(path: &Path, config: &OverlayConfig) -> Result<Self, PipelineError> {
        tracing::debug!(path = %path.display(), "Reading authoritative spreadsheet");

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| PipelineError::Spreadsheet(format!("{}: {e}", path.display())))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PipelineError::Spreadsheet(format!("{}: no worksheet", path.display())))?
            .map_err(|e| PipelineError::Spreadsheet(format!("{}: {e}", path.display())))?;

        let overlay = Self::from_rows(absolute_rows(&range), config.header_rows, config.column);
        tracing::info!(entries = overlay.len(), "Loaded authoritative overlay");

        Ok(overlay)
    }

    /// Trimmed, non-empty override for `section`.
    #[must_use]
    pub fn get(&self, section: SectionId) -> Option<&str> {
        self.values.get(&section).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows of `range` anchored at A1.
///
/// calamine only returns the used range, which starts at the first non-empty
/// cell. Leading blank rows and columns are restored as empty cells.
fn absolute_rows(range: &Range<Data>) -> impl Iterator<Item = Vec<Data>> + '_ {
    let (start_row, start_col) = range.start().unwrap_or_default();
    let leading_rows = usize::try_from(start_row).unwrap_or_default();
    let leading_cols = usize::try_from(start_col).unwrap_or_default();

    std::iter::repeat_with(Vec::new).take(leading_rows).chain(range.rows().map(move |row| {
        let mut cells = vec![Data::Empty; leading_cols];
        cells.extend_from_slice(row);
        cells
    }))
}

impl FromIterator<(SectionId, String)> for AuthoritativeOverlay {
    fn from_iter<T: IntoIterator<Item = (SectionId, String)>>(iter: T) -> Self {
        let values = iter
            .into_iter()
            .map(|(section, text)| (section, text.trim().to_string()))
            .filter(|(_, text)| !text.is_empty())
            .collect();
        Self { values }
    }
}
