//! Sheet cell rewriter.
//!
//! A cell containing the placeholder anywhere in its text is replaced whole by
//! an `=IMAGE("…")` formula. The Sheets API writes complete rows, so every
//! other cell of a touched row is echoed back. Rows are written with
//! `USER_ENTERED`, which would re-parse plain text such as `00123` or `TRUE`;
//! see [`preserve_cell`].

use serde::Serialize;
use serde_json::Value;

/// Address of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAddress {
    /// Sheet title.
    pub sheet: String,
    /// 1-based row number.
    pub row: usize,
    /// 0-based column index.
    pub column: usize,
}

impl CellAddress {
    /// Renders the address in A1 notation, e.g. `'Sheet 1'!C4`.
    pub fn a1(&self) -> String {
        format!(
            "{}!{}{}",
            quote_sheet_title(&self.sheet),
            column_letters(self.column),
            self.row
        )
    }
}

/// One row to write back, starting at column A.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowUpdate {
    /// A1 range of the row's first cell.
    pub range: String,
    /// Always `ROWS`.
    pub major_dimension: &'static str,
    /// A single row of values.
    pub values: [Vec<Value>; 1],
}

impl RowUpdate {
    fn new(sheet: &str, row: usize, values: Vec<Value>) -> Self {
        Self {
            range: format!("{}!A{}", quote_sheet_title(sheet), row),
            major_dimension: "ROWS",
            values: [values],
        }
    }

    /// The row's cell values.
    pub fn cells(&self) -> &[Value] {
        &self.values[0]
    }
}

/// Outcome of rewriting one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetRewrite {
    /// Sheet title.
    pub title: String,
    /// Rows that contain at least one replaced cell.
    pub rows: Vec<RowUpdate>,
    /// Every replaced cell.
    pub cells_replaced: Vec<CellAddress>,
}

impl SheetRewrite {
    /// True if any cell was replaced.
    pub fn is_modified(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// Builds the `=IMAGE("…")` formula for `url`, doubling embedded quotes.
pub fn image_formula(url: &str) -> String {
    format!("=IMAGE(\"{}\")", url.replace('"', "\"\""))
}

/// Rewrites every cell of `values` that contains `placeholder`.
///
/// `values` is the sheet's full grid as returned by the values endpoint, row 1
/// first. Only string cells are inspected; numbers and booleans never match.
pub fn rewrite_sheet(
    title: &str,
    values: &[Vec<Value>],
    placeholder: &str,
    image_url: &str,
) -> SheetRewrite {
    let mut rewrite = SheetRewrite {
        title: title.to_string(),
        ..Default::default()
    };
    if placeholder.is_empty() {
        return rewrite;
    }
    let formula = image_formula(image_url);

    for (index, row) in values.iter().enumerate() {
        let row_number = index + 1;
        let mut touched = false;
        let updated: Vec<Value> = row
            .iter()
            .enumerate()
            .map(|(column, cell)| match cell {
                Value::String(text) if text.contains(placeholder) => {
                    touched = true;
                    rewrite.cells_replaced.push(CellAddress {
                        sheet: title.to_string(),
                        row: row_number,
                        column,
                    });
                    Value::String(formula.clone())
                }
                other => preserve_cell(other),
            })
            .collect();

        if touched {
            rewrite.rows.push(RowUpdate::new(title, row_number, updated));
        }
    }

    rewrite
}

/// Returns `cell` in the form that makes `USER_ENTERED` store it unchanged.
///
/// Text is prefixed with `'` so it stays literal text. Formulas (read with
/// `valueRenderOption=FORMULA`), numbers, booleans and empty cells pass through.
pub fn preserve_cell(cell: &Value) -> Value {
    match cell {
        Value::String(text) if !text.is_empty() && !text.starts_with('=') => {
            Value::String(format!("'{}", text))
        }
        other => other.clone(),
    }
}

/// Quotes a sheet title for use in an A1 range.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Converts a 0-based column index to letters (0 → A, 26 → AA).
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (column % 26) as u8) as char);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.iter().rev().collect()
}
