//! Replace orchestration: classifies the document URL and runs the Docs or
//! Sheets pipeline against a freshly fetched snapshot.

use crate::docs::{self, DocsApi, ImagePlacement, Located, DEFAULT_IMAGE_PT};
use crate::error::{ImageSwapError, Result};
use crate::sheets::{self, SheetsApi};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Placeholder used when the request does not name one.
pub const DEFAULT_PLACEHOLDER: &str = "{{images}}";

static DOCS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://docs\.google\.com/document/(?:u/\d+/)?d/([A-Za-z0-9_-]+)")
        .expect("valid docs URL pattern")
});

static SHEETS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://docs\.google\.com/spreadsheets/(?:u/\d+/)?d/([A-Za-z0-9_-]+)")
        .expect("valid sheets URL pattern")
});

/// An authenticated handle able to talk to both Docs and Sheets.
pub trait WorkspaceSession: DocsApi + SheetsApi {}

impl<T: DocsApi + SheetsApi> WorkspaceSession for T {}

/// Opens sessions against the office suite. Each call exchanges credentials.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Authenticates and returns a session for one request.
    async fn connect(&self) -> Result<Box<dyn WorkspaceSession>>;
}

/// Which office application a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// Google Docs.
    Docs,
    /// Google Sheets.
    Sheets,
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docs => write!(f, "docs"),
            Self::Sheets => write!(f, "sheets"),
        }
    }
}

/// A document resolved from its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTarget {
    /// Docs or Sheets.
    pub kind: DocKind,
    /// Document or spreadsheet id.
    pub id: String,
}

impl DocTarget {
    /// Returns the kind of a recognised Docs/Sheets URL.
    pub fn kind_of(url: &str) -> Option<DocKind> {
        let url = url.trim();
        if DOCS_URL.is_match(url) {
            Some(DocKind::Docs)
        } else if SHEETS_URL.is_match(url) {
            Some(DocKind::Sheets)
        } else {
            None
        }
    }

    /// Classifies `doc_url`; a non-empty `id_override` replaces the parsed id.
    pub fn parse(doc_url: &str, id_override: Option<&str>) -> Result<Self> {
        let url = doc_url.trim();
        let (kind, captures) = if let Some(c) = DOCS_URL.captures(url) {
            (DocKind::Docs, c)
        } else if let Some(c) = SHEETS_URL.captures(url) {
            (DocKind::Sheets, c)
        } else {
            return Err(ImageSwapError::Validation(format!(
                "unsupported document URL: {}",
                doc_url
            )));
        };

        let id = match id_override.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => captures[1].to_string(),
        };
        Ok(Self { kind, id })
    }
}

/// Body of `POST /replace-image`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRequest {
    /// URL of the Docs or Sheets document.
    #[serde(default)]
    pub doc_url: String,
    /// URL of the image to insert.
    #[serde(default)]
    pub image_url: String,
    /// Text to replace; defaults to `{{images}}`.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Rendered width in points (Docs only).
    #[serde(default)]
    pub width_pt: Option<f64>,
    /// Rendered height in points (Docs only).
    #[serde(default)]
    pub height_pt: Option<f64>,
    /// Explicit document id, overriding the one in `doc_url`.
    #[serde(default)]
    pub document_id: Option<String>,
}

impl ReplaceRequest {
    /// Creates a request with defaults for everything optional.
    pub fn new(doc_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            doc_url: doc_url.into(),
            image_url: image_url.into(),
            ..Default::default()
        }
    }

    /// Checks the request without touching the network.
    pub fn validate(&self) -> Result<ValidatedReplace> {
        if self.doc_url.trim().is_empty() {
            return Err(ImageSwapError::Validation("docUrl is required".into()));
        }
        if self.image_url.trim().is_empty() {
            return Err(ImageSwapError::Validation("imageUrl is required".into()));
        }

        let target = DocTarget::parse(&self.doc_url, self.document_id.as_deref())?;

        let placeholder = self
            .placeholder
            .clone()
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string());
        if placeholder.is_empty() {
            return Err(ImageSwapError::Validation(
                "placeholder must not be empty".into(),
            ));
        }

        let width_pt = self.width_pt.unwrap_or(DEFAULT_IMAGE_PT);
        let height_pt = self.height_pt.unwrap_or(DEFAULT_IMAGE_PT);
        if !(width_pt.is_finite() && width_pt > 0.0 && height_pt.is_finite() && height_pt > 0.0) {
            return Err(ImageSwapError::Validation(
                "widthPt and heightPt must be positive numbers".into(),
            ));
        }

        Ok(ValidatedReplace {
            target,
            placeholder,
            image: ImagePlacement::new(self.image_url.trim()).with_size(width_pt, height_pt),
        })
    }
}

/// A replace request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReplace {
    /// Resolved document.
    pub target: DocTarget,
    /// Placeholder text.
    pub placeholder: String,
    /// Image and size.
    pub image: ImagePlacement,
}

/// Replacement count, or a flag for the single-image fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Replaced {
    /// Number of occurrences (Docs) or sheets (Sheets) modified.
    Count(usize),
    /// Whether the fallback image was replaced.
    Flag(bool),
}

/// How the Docs target was found, when not by placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceMode {
    /// The first inline image was replaced.
    FirstImage,
}

/// Response body of `POST /replace-image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    /// What was replaced.
    pub replaced: Replaced,
    /// Document kind.
    #[serde(rename = "type")]
    pub kind: DocKind,
    /// Set when the image fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ReplaceMode>,
}

/// Validates `request`, connects, and runs the matching pipeline.
///
/// Validation happens before [`Workspace::connect`], so malformed requests
/// never reach the credential exchange.
pub async fn replace_image<W: Workspace + ?Sized>(
    workspace: &W,
    request: &ReplaceRequest,
) -> Result<ReplaceOutcome> {
    let job = request.validate()?;
    let session = workspace.connect().await?;

    let outcome = match job.target.kind {
        DocKind::Docs => {
            replace_in_document(&*session, &job.target.id, &job.placeholder, &job.image).await?
        }
        DocKind::Sheets => {
            replace_in_spreadsheet(&*session, &job.target.id, &job.placeholder, &job.image.uri)
                .await?
        }
    };

    tracing::info!(
        kind = %job.target.kind,
        id = %job.target.id,
        replaced = ?outcome.replaced,
        "replace finished"
    );
    Ok(outcome)
}

/// Docs pipeline: fetch, locate, plan, submit.
pub async fn replace_in_document<D: DocsApi + ?Sized>(
    api: &D,
    document_id: &str,
    placeholder: &str,
    image: &ImagePlacement,
) -> Result<ReplaceOutcome> {
    let doc = api.get_document(document_id).await?;
    let located = docs::locate(&doc, placeholder)?;
    let ops = docs::plan(located.occurrences(), image);
    tracing::debug!(
        document_id,
        occurrences = located.occurrences().len(),
        fallback = located.is_fallback(),
        ops = ops.len(),
        "planned document mutation"
    );

    if !ops.is_empty() {
        api.batch_update(document_id, &ops).await?;
    }

    let (replaced, mode) = match &located {
        Located::Placeholders(found) => (Replaced::Count(found.len()), None),
        Located::FirstImage(_) => (Replaced::Flag(true), Some(ReplaceMode::FirstImage)),
        Located::NoTarget => (Replaced::Count(0), None),
    };

    Ok(ReplaceOutcome {
        replaced,
        kind: DocKind::Docs,
        mode,
    })
}

/// Sheets pipeline: list sheets, rewrite each, write back once.
pub async fn replace_in_spreadsheet<S: SheetsApi + ?Sized>(
    api: &S,
    spreadsheet_id: &str,
    placeholder: &str,
    image_url: &str,
) -> Result<ReplaceOutcome> {
    let titles = api.sheet_titles(spreadsheet_id).await?;

    let mut rows = Vec::new();
    let mut sheets_modified = 0;
    for title in &titles {
        let values = api.sheet_values(spreadsheet_id, title).await?;
        let rewrite = sheets::rewrite_sheet(title, &values, placeholder, image_url);
        if rewrite.is_modified() {
            tracing::debug!(
                sheet = %title,
                cells = rewrite.cells_replaced.len(),
                "sheet has placeholder cells"
            );
            sheets_modified += 1;
            rows.extend(rewrite.rows);
        }
    }

    if !rows.is_empty() {
        api.batch_update_values(spreadsheet_id, &rows).await?;
    }

    Ok(ReplaceOutcome {
        replaced: Replaced::Count(sheets_modified),
        kind: DocKind::Sheets,
        mode: None,
    })
}


#[cfg(test)]
mod tests {
    use super::fake::FakeWorkspace;
    use super::*;
    use crate::docs::locate::fixtures::*;
    use crate::docs::{DocIndex, MutationOp};
    use serde_json::json;

    const DOC_URL: &str = "https://docs.google.com/document/d/abc123_-XY/edit";
    const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/sheet987/edit#gid=0";
    const IMAGE: &str = "https://cdn.example/new.png";

    #[test]
    fn test_parse_docs_url() {
        let target = DocTarget::parse(DOC_URL, None).unwrap();
        assert_eq!(target.kind, DocKind::Docs);
        assert_eq!(target.id, "abc123_-XY");
    }

    #[test]
    fn test_parse_sheets_url_with_account_segment() {
        let target =
            DocTarget::parse("https://docs.google.com/spreadsheets/u/1/d/xyz/edit", None).unwrap();
        assert_eq!(target.kind, DocKind::Sheets);
        assert_eq!(target.id, "xyz");
    }

    #[test]
    fn test_document_id_override() {
        let target = DocTarget::parse(DOC_URL, Some("override-id")).unwrap();
        assert_eq!(target.id, "override-id");
        // Blank overrides are ignored
        let target = DocTarget::parse(DOC_URL, Some("  ")).unwrap();
        assert_eq!(target.id, "abc123_-XY");
    }

    #[test]
    fn test_unsupported_url() {
        for url in [
            "https://example.com/document/d/abc",
            "https://docs.google.com/presentation/d/abc/edit",
            "not a url",
        ] {
            assert!(matches!(
                DocTarget::parse(url, None),
                Err(ImageSwapError::Validation(_))
            ));
            assert_eq!(DocTarget::kind_of(url), None);
        }
    }

    #[test]
    fn test_request_defaults() {
        let request: ReplaceRequest =
            serde_json::from_value(json!({"docUrl": DOC_URL, "imageUrl": IMAGE})).unwrap();
        let job = request.validate().unwrap();
        assert_eq!(job.placeholder, DEFAULT_PLACEHOLDER);
        assert_eq!(job.image, ImagePlacement::new(IMAGE));
    }

    #[test]
    fn test_request_missing_fields() {
        let err = ReplaceRequest::new("", IMAGE).validate().unwrap_err();
        assert!(err.to_string().contains("docUrl"));
        let err = ReplaceRequest::new(DOC_URL, " ").validate().unwrap_err();
        assert!(err.to_string().contains("imageUrl"));
    }

    #[test]
    fn test_request_rejects_bad_dimensions() {
        let mut request = ReplaceRequest::new(DOC_URL, IMAGE);
        request.width_pt = Some(-5.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ReplaceOutcome {
            replaced: Replaced::Flag(true),
            kind: DocKind::Docs,
            mode: Some(ReplaceMode::FirstImage),
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            json!({"replaced": true, "type": "docs", "mode": "first-image"})
        );

        let outcome = ReplaceOutcome {
            replaced: Replaced::Count(0),
            kind: DocKind::Sheets,
            mode: None,
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            json!({"replaced": 0, "type": "sheets"})
        );
    }

    #[tokio::test]
    async fn test_docs_placeholders_replaced_descending() {
        let workspace = FakeWorkspace::with_document(document(vec![
            paragraph(vec![text(1, "Intro\n")]),
            paragraph(vec![text(7, "abc{{images}}\n")]),
            paragraph(vec![text(21, "{{images}} end\n")]),
        ]));

        let outcome = replace_image(&workspace, &ReplaceRequest::new(DOC_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(2));
        assert_eq!(outcome.kind, DocKind::Docs);
        assert_eq!(outcome.mode, None);

        let calls = workspace.calls();
        assert_eq!(calls.connects, 1);
        assert_eq!(calls.fetched_documents, vec!["abc123_-XY"]);
        assert_eq!(calls.batches.len(), 1);
        let starts: Vec<u32> = calls.batches[0].1.iter().map(|op| op.start().get()).collect();
        assert_eq!(starts, vec![21, 21, 10, 10]);
        assert!(matches!(
            calls.batches[0].1[0],
            MutationOp::DeleteRange { end, .. } if end == DocIndex::new(31)
        ));
    }

    #[tokio::test]
    async fn test_docs_heading_mirrored_in_toc_edits_body_only() {
        let workspace = FakeWorkspace::with_document(document(vec![
            table_of_contents(vec![paragraph(vec![text(5, "{{images}}\n")])]),
            paragraph(vec![text(40, "{{images}}\n")]),
        ]));

        let outcome = replace_image(&workspace, &ReplaceRequest::new(DOC_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(1));

        let calls = workspace.calls();
        let starts: Vec<u32> = calls.batches[0].1.iter().map(|op| op.start().get()).collect();
        assert_eq!(starts, vec![40, 40]);
    }

    #[tokio::test]
    async fn test_docs_first_image_fallback() {
        let workspace = FakeWorkspace::with_document(document(vec![paragraph(vec![
            text(1, "Logo: "),
            image(7),
            text(8, "\n"),
        ])]));

        let outcome = replace_image(&workspace, &ReplaceRequest::new(DOC_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Flag(true));
        assert_eq!(outcome.mode, Some(ReplaceMode::FirstImage));

        let calls = workspace.calls();
        let ops = &calls.batches[0].1;
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            MutationOp::DeleteRange {
                start: DocIndex::new(7),
                end: DocIndex::new(8)
            }
        );
        assert_eq!(ops[1].start(), DocIndex::new(7));
    }

    #[tokio::test]
    async fn test_docs_no_target_submits_nothing() {
        let workspace =
            FakeWorkspace::with_document(document(vec![paragraph(vec![text(1, "Plain\n")])]));

        let outcome = replace_image(&workspace, &ReplaceRequest::new(DOC_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(0));
        assert!(workspace.calls().batches.is_empty());
    }

    #[tokio::test]
    async fn test_docs_batch_failure_is_surfaced() {
        let mut workspace = FakeWorkspace::with_document(document(vec![paragraph(vec![text(
            1,
            "{{images}}\n",
        )])]));
        workspace.fail_batch = true;

        let err = replace_image(&workspace, &ReplaceRequest::new(DOC_URL, IMAGE))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageSwapError::Upstream { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_sheets_rewrite_single_row() {
        let workspace = FakeWorkspace::with_sheets(vec![(
            "Sheet1",
            vec![vec![json!("{{images}} here"), json!("other")]],
        )]);

        let outcome = replace_image(&workspace, &ReplaceRequest::new(SHEET_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(1));
        assert_eq!(outcome.kind, DocKind::Sheets);

        let calls = workspace.calls();
        assert_eq!(calls.writes.len(), 1);
        let (id, rows) = &calls.writes[0];
        assert_eq!(id, "sheet987");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].cells(),
            &[json!("=IMAGE(\"https://cdn.example/new.png\")"), json!("'other")]
        );
    }

    #[tokio::test]
    async fn test_sheets_counts_sheets_not_cells() {
        let workspace = FakeWorkspace::with_sheets(vec![
            (
                "A",
                vec![vec![json!("{{images}}")], vec![json!("{{images}}"), json!("{{images}}")]],
            ),
            ("B", vec![vec![json!("nothing")]]),
            ("C", vec![vec![json!("x{{images}}")]]),
        ]);

        let outcome = replace_in_spreadsheet(&workspace, "s", DEFAULT_PLACEHOLDER, IMAGE)
            .await
            .unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(2));

        let calls = workspace.calls();
        assert_eq!(calls.fetched_sheets, vec!["A", "B", "C"]);
        assert_eq!(calls.writes.len(), 1);
        let ranges: Vec<&str> = calls.writes[0].1.iter().map(|r| r.range.as_str()).collect();
        assert_eq!(ranges, vec!["'A'!A1", "'A'!A2", "'C'!A1"]);
    }

    #[tokio::test]
    async fn test_sheets_without_matches_issue_no_write() {
        let workspace = FakeWorkspace::with_sheets(vec![
            ("A", vec![vec![json!("plain")]]),
            ("B", vec![]),
        ]);

        let outcome = replace_image(&workspace, &ReplaceRequest::new(SHEET_URL, IMAGE))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            json!({"replaced": 0, "type": "sheets"})
        );
        assert!(workspace.calls().writes.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_url_never_connects() {
        let workspace = FakeWorkspace::default();
        let err = replace_image(
            &workspace,
            &ReplaceRequest::new("https://example.com/page", IMAGE),
        )
        .await
        .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(workspace.calls().connects, 0);
    }

    #[tokio::test]
    async fn test_custom_placeholder_and_size() {
        let workspace =
            FakeWorkspace::with_document(document(vec![paragraph(vec![text(1, "[[hero]]\n")])]));
        let mut request = ReplaceRequest::new(DOC_URL, IMAGE);
        request.placeholder = Some("[[hero]]".into());
        request.width_pt = Some(320.0);
        request.height_pt = Some(180.0);

        let outcome = replace_image(&workspace, &request).await.unwrap();
        assert_eq!(outcome.replaced, Replaced::Count(1));

        let calls = workspace.calls();
        assert_eq!(
            calls.batches[0].1[1],
            MutationOp::InsertImage {
                at: DocIndex::new(1),
                uri: IMAGE.into(),
                width_pt: 320.0,
                height_pt: 180.0,
            }
        );
    }
}
