//! Upstage document OCR output.
//!
//! ```json
//! { "pages": [ { "lines": [ { "text": "...",
//!     "boundingBox": [ { "vertices": [ { "x": 1, "y": 2 }, ... ] } ] } ] } ] }
//! ```
//!
//! A single line may be split across several boxes. We merge them into one
//! annotation covering all of their vertices.

use crate::{geometry::Vertex, io::read_json, prelude::*};

use super::{Annotation, AnnotationSet, AnnotationSource, default_on_null};

/// A complete Upstage OCR response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstageDocument {
    #[serde(default, deserialize_with = "default_on_null")]
    pub pages: Vec<UpstagePage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstagePage {
    #[serde(default, deserialize_with = "default_on_null")]
    pub lines: Vec<UpstageLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstageLine {
    #[serde(default, deserialize_with = "default_on_null")]
    pub text: String,

    #[serde(default, deserialize_with = "default_on_null")]
    pub bounding_box: Vec<UpstageBox>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstageBox {
    #[serde(default, deserialize_with = "default_on_null")]
    pub vertices: Vec<Vertex>,
}

impl UpstageLine {
    /// All vertices of all boxes of this line, in order.
    fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.bounding_box
            .iter()
            .flat_map(|bbox| bbox.vertices.iter().copied())
    }
}

impl AnnotationSource for UpstageDocument {
    fn annotations(&self) -> AnnotationSet {
        self.pages
            .iter()
            .flat_map(|page| &page.lines)
            .filter_map(|line| Annotation::from_vertices(&line.text, line.vertices()))
            .collect()
    }
}

/// Parse Upstage OCR JSON into annotations.
pub fn parse_upstage(json: &str) -> Result<AnnotationSet> {
    let doc = serde_json::from_str::<UpstageDocument>(json)
        .context("failed to parse Upstage OCR JSON")?;
    Ok(doc.annotations())
}

/// Load Upstage OCR JSON from `path` and normalize it.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_upstage(path: &Path) -> Result<AnnotationSet> {
    let doc = read_json::<UpstageDocument>(path).await?;
    let annotations = doc.annotations();
    debug!(count = annotations.len(), "Loaded Upstage annotations");
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use crate::geometry::Coord;

    use super::*;

    fn parse(value: Value) -> AnnotationSet {
        parse_upstage(&value.to_string()).unwrap()
    }

    #[test]
    fn test_empty_and_missing_pages() {
        assert!(parse(json!({ "pages": [] })).is_empty());
        assert!(parse(json!({})).is_empty());
        assert!(parse(json!({ "pages": null })).is_empty());
    }

    #[test]
    fn test_single_line() {
        let annotations = parse(json!({
            "pages": [{
                "lines": [{
                    "text": "A",
                    "boundingBox": [{ "vertices": [{ "x": 1, "y": 2 }, { "x": 5, "y": 6 }] }],
                }],
            }],
        }));
        assert_eq!(
            annotations,
            vec![Annotation {
                text: "A".to_owned(),
                left: Coord::Int(1),
                top: Coord::Int(2),
                width: Coord::Int(4),
                height: Coord::Int(4),
            }]
        );
        let json = serde_json::to_value(&annotations).unwrap();
        assert!(json[0]["left"].is_i64());
    }

    #[test]
    fn test_boxes_are_merged_per_line() {
        let annotations = parse(json!({
            "pages": [{
                "lines": [{
                    "text": "split line",
                    "boundingBox": [
                        { "vertices": [{ "x": 10, "y": 10 }, { "x": 20, "y": 15 }] },
                        { "vertices": [{ "x": 30, "y": 12 }, { "x": 45, "y": 30 }] },
                    ],
                }],
            }],
        }));
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].left, Coord::Int(10));
        assert_eq!(annotations[0].top, Coord::Int(10));
        assert_eq!(annotations[0].width, Coord::Int(35));
        assert_eq!(annotations[0].height, Coord::Int(20));
    }

    #[test]
    fn test_lines_without_vertices_are_skipped() {
        let annotations = parse(json!({
            "pages": [
                {
                    "lines": [
                        { "text": "no boxes" },
                        { "text": "empty box", "boundingBox": [{ "vertices": [] }] },
                        { "text": "kept", "boundingBox": [{ "vertices": [{ "x": 3 }] }] },
                    ],
                },
                {},
            ],
        }));
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text, "kept");
        assert_eq!(annotations[0].top, Coord::Int(0));
    }

    #[test]
    fn test_order_follows_source() {
        let line = |text: &str, x: i64| {
            json!({ "text": text, "boundingBox": [{ "vertices": [{ "x": x, "y": 0 }] }] })
        };
        let annotations = parse(json!({
            "pages": [
                { "lines": [line("first", 90), line("second", 10)] },
                { "lines": [line("third", 50)] },
            ],
        }));
        let texts = annotations.iter().map(|a| a.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn test_missing_text_is_empty() {
        let annotations = parse(json!({
            "pages": [{
                "lines": [{ "boundingBox": [{ "vertices": [{ "x": 1.5, "y": 2 }] }] }],
            }],
        }));
        assert_eq!(annotations[0].text, "");
        assert!(matches!(annotations[0].left, Coord::Float(f) if f == 1.5));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_upstage("{ not json").is_err());
    }
}
