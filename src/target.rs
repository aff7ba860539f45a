//! Image-target detection for the browser plugin.
//!
//! The plugin forwards the click it received (page URL plus the event's
//! composed path) and gets back what should be replaced. Nothing is
//! remembered between clicks.

use crate::replace::{DocKind, DocTarget};
use serde::{Deserialize, Serialize};

/// A click as seen by the plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    /// URL of the page the click happened on.
    pub page_url: String,
    /// `event.composedPath()` elements, innermost first.
    #[serde(default)]
    pub path: Vec<ElementInfo>,
}

/// The attributes of a DOM element relevant to image detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Lowercase or uppercase tag name.
    #[serde(default)]
    pub tag: String,
    /// `src` attribute.
    #[serde(default)]
    pub src: Option<String>,
    /// `currentSrc`, the source actually chosen from `srcset`.
    #[serde(default)]
    pub current_src: Option<String>,
    /// Computed `background-image` style.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Rendered width in CSS pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Rendered height in CSS pixels.
    #[serde(default)]
    pub height: Option<u32>,
}

/// How the image is referenced by the page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSource {
    /// An `<img>` element's source.
    ImgElement,
    /// A CSS `background-image`.
    Background,
}

/// What a click resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ImageTarget {
    /// An image in a live page, replaced by DOM mutation.
    #[serde(rename_all = "camelCase")]
    Element {
        /// Position of the element in the click path.
        path_index: usize,
        /// Current image URL.
        src: String,
        /// How the image is attached.
        source: ImageSource,
        /// Rendered width, used as the generation size.
        width: Option<u32>,
        /// Rendered height, used as the generation size.
        height: Option<u32>,
    },
    /// A Docs or Sheets document, replaced through `/replace-image`.
    #[serde(rename_all = "camelCase")]
    Document {
        /// Document URL to send as `docUrl`.
        doc_url: String,
        /// Docs or Sheets.
        kind: DocKind,
    },
}

/// Resolves the image a click refers to.
pub fn detect_target(event: &ClickEvent) -> Option<ImageTarget> {
    if let Some(kind) = DocTarget::kind_of(&event.page_url) {
        return Some(ImageTarget::Document {
            doc_url: event.page_url.trim().to_string(),
            kind,
        });
    }

    let img = event.path.iter().enumerate().find_map(|(i, el)| {
        if !el.tag.eq_ignore_ascii_case("img") {
            return None;
        }
        let src = non_empty(el.current_src.as_deref()).or(non_empty(el.src.as_deref()))?;
        Some(element_target(i, el, src.to_string(), ImageSource::ImgElement))
    });
    if img.is_some() {
        return img;
    }

    event.path.iter().enumerate().find_map(|(i, el)| {
        let url = el.background_image.as_deref().and_then(css_url)?;
        Some(element_target(i, el, url, ImageSource::Background))
    })
}

fn element_target(
    path_index: usize,
    el: &ElementInfo,
    src: String,
    source: ImageSource,
) -> ImageTarget {
    ImageTarget::Element {
        path_index,
        src,
        source,
        width: el.width,
        height: el.height,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Extracts the first URL from a CSS `url(...)` value.
fn css_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + "url(".len();
    let end = start + value[start..].find(')')?;
    let url = value[start..end]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    (!url.is_empty()).then(|| url.to_string())
}
