//! Document reader and batch executor.

use super::model::Document;
use super::plan::MutationOp;
use crate::error::Result;
use crate::google::GoogleSession;
use async_trait::async_trait;
use serde::Serialize;

/// Remote Docs operations used by the replace pipeline.
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Fetches the current content tree.
    async fn get_document(&self, document_id: &str) -> Result<Document>;

    /// Applies `ops` as one all-or-nothing batch, in order.
    async fn batch_update(&self, document_id: &str, ops: &[MutationOp]) -> Result<()>;
}

#[derive(Serialize)]
struct BatchUpdateBody<'a> {
    requests: &'a [MutationOp],
}

#[async_trait]
impl DocsApi for GoogleSession {
    async fn get_document(&self, document_id: &str) -> Result<Document> {
        let url = format!("{}/documents/{}", self.docs_base, document_id);
        tracing::debug!(document_id, "fetching document");
        self.get_json("docs", &url, &[]).await
    }

    async fn batch_update(&self, document_id: &str, ops: &[MutationOp]) -> Result<()> {
        let url = format!("{}/documents/{}:batchUpdate", self.docs_base, document_id);
        tracing::debug!(document_id, ops = ops.len(), "submitting document batch");
        let _: serde_json::Value = self
            .post_json("docs", &url, &BatchUpdateBody { requests: ops })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::offset::DocIndex;

    #[test]
    fn test_batch_body_shape() {
        let ops = [MutationOp::DeleteRange {
            start: DocIndex::new(1),
            end: DocIndex::new(3),
        }];
        let json = serde_json::to_value(BatchUpdateBody { requests: &ops }).unwrap();
        assert_eq!(
            json["requests"][0]["deleteContentRange"]["range"]["endIndex"],
            3
        );
    }
}
