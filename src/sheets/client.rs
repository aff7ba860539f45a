//! Spreadsheet reader and row write-back.

use super::rewrite::{quote_sheet_title, RowUpdate};
use crate::error::Result;
use crate::google::GoogleSession;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote Sheets operations used by the replace pipeline.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Titles of every sheet, in tab order.
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    /// The full value grid of one sheet, formulas unevaluated.
    async fn sheet_values(&self, spreadsheet_id: &str, title: &str) -> Result<Vec<Vec<Value>>>;

    /// Writes every row update in a single request.
    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        rows: &[RowUpdate],
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateValues<'a> {
    value_input_option: &'static str,
    data: &'a [RowUpdate],
}

#[async_trait]
impl SheetsApi for GoogleSession {
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/spreadsheets/{}", self.sheets_base, spreadsheet_id);
        let meta: SpreadsheetMeta = self
            .get_json("sheets", &url, &[("fields", "sheets.properties.title")])
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn sheet_values(&self, spreadsheet_id: &str, title: &str) -> Result<Vec<Vec<Value>>> {
        let range = quote_sheet_title(title);
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.sheets_base,
            spreadsheet_id,
            urlencoding::encode(&range)
        );
        let range: ValueRange = self
            .get_json("sheets", &url, &[("valueRenderOption", "FORMULA")])
            .await?;
        Ok(range.values)
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        rows: &[RowUpdate],
    ) -> Result<()> {
        let url = format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            self.sheets_base, spreadsheet_id
        );
        tracing::debug!(spreadsheet_id, rows = rows.len(), "writing back sheet rows");
        let body = BatchUpdateValues {
            value_input_option: "USER_ENTERED",
            data: rows,
        };
        let _: Value = self.post_json("sheets", &url, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spreadsheet_meta_deserialization() {
        let json = r#"{"sheets": [
            {"properties": {"title": "Sheet1"}},
            {"properties": {"title": "Q1 Plan"}}
        ]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(json).unwrap();
        let titles: Vec<_> = meta.sheets.into_iter().map(|s| s.properties.title).collect();
        assert_eq!(titles, vec!["Sheet1", "Q1 Plan"]);
    }

    #[test]
    fn test_empty_value_range() {
        // The API omits `values` entirely for an empty sheet
        let range: ValueRange =
            serde_json::from_str(r#"{"range": "Sheet1!A1:Z1000", "majorDimension": "ROWS"}"#)
                .unwrap();
        assert!(range.values.is_empty());
    }

    #[test]
    fn test_batch_update_values_shape() {
        let rows = crate::sheets::rewrite_sheet(
            "Sheet1",
            &[vec![json!("{{images}}"), json!("00123")]],
            "{{images}}",
            "https://cdn.example/a.png",
        )
        .rows;
        let body = BatchUpdateValues {
            value_input_option: "USER_ENTERED",
            data: &rows,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["valueInputOption"], "USER_ENTERED");
        assert_eq!(json["data"][0]["range"], "'Sheet1'!A1");
        assert_eq!(json["data"][0]["values"][0][1], "'00123");
    }
}
