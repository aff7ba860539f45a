//! Google Sheets: finding placeholder cells and writing image formulas back.

mod client;
pub mod rewrite;

pub use client::SheetsApi;
pub use rewrite::{image_formula, rewrite_sheet, CellAddress, RowUpdate, SheetRewrite};
