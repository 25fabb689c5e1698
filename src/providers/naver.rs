//! Naver CLOVA OCR output.
//!
//! ```json
//! { "originalFileName": "img1", "imageType": "jpg",
//!   "images": [ { "fields": [ { "inferText": "...",
//!       "boundingPoly": { "vertices": [ { "x": 0.0, "y": 0.0 }, ... ] } } ] } ] }
//! ```
//!
//! CLOVA reports coordinates as floats, so every coordinate we produce from
//! this format is a float, even when the payload happens to contain integers.

use schemars::JsonSchema;

use crate::{
    geometry::{Coord, Vertex, reduce},
    io::read_json,
    prelude::*,
};

use super::{Annotation, AnnotationSet, AnnotationSource, default_on_null};

/// Image type assumed when the payload doesn't name one.
const DEFAULT_IMAGE_TYPE: &str = "jpg";

/// A complete CLOVA OCR response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaverDocument {
    #[serde(default, deserialize_with = "default_on_null")]
    pub images: Vec<NaverImage>,

    /// The name of the uploaded image, without extension.
    #[serde(default, deserialize_with = "default_on_null")]
    pub original_file_name: String,

    /// The declared image format. Defaults to [`DEFAULT_IMAGE_TYPE`].
    #[serde(default)]
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaverImage {
    #[serde(default, deserialize_with = "default_on_null")]
    pub fields: Vec<NaverField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaverField {
    #[serde(default, deserialize_with = "default_on_null")]
    pub infer_text: String,

    #[serde(default, deserialize_with = "default_on_null")]
    pub bounding_poly: BoundingPoly,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundingPoly {
    #[serde(default, deserialize_with = "default_on_null")]
    pub vertices: Vec<Vertex>,
}

impl NaverField {
    fn annotation(&self) -> Option<Annotation> {
        let vertices = self
            .bounding_poly
            .vertices
            .iter()
            .map(|vertex| vertex.map(Coord::as_f64));
        let bbox = reduce(vertices)?;
        Some(Annotation::new(&self.infer_text, bbox.map(Coord::from)))
    }
}

impl NaverDocument {
    /// The declared image type, or `"jpg"`.
    pub fn image_type(&self) -> &str {
        self.image_type.as_deref().unwrap_or(DEFAULT_IMAGE_TYPE)
    }

    /// The URL of the image these annotations belong to, or an empty string if
    /// the payload doesn't name its image.
    ///
    /// This always uses a `.jpg` suffix, whatever `imageType` says, because
    /// the static directory only ever holds `.jpg` files.
    pub fn image_url(&self) -> String {
        if self.original_file_name.is_empty() {
            String::new()
        } else {
            format!("/static/{}.jpg", self.original_file_name)
        }
    }

    /// Normalize this document into an [`ImageRecord`].
    pub fn to_record(&self) -> ImageRecord {
        ImageRecord {
            image_url: self.image_url(),
            annotations: self.annotations(),
            original_file_name: self.original_file_name.clone(),
            image_type: self.image_type().to_owned(),
        }
    }
}

impl AnnotationSource for NaverDocument {
    fn annotations(&self) -> AnnotationSet {
        self.images
            .iter()
            .flat_map(|image| &image.fields)
            .filter_map(NaverField::annotation)
            .collect()
    }
}

/// Normalized CLOVA OCR output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ImageRecord {
    /// Where to fetch the image from, or empty if unknown.
    pub image_url: String,

    /// Annotations, in source order.
    pub annotations: AnnotationSet,

    /// The image name reported by the provider.
    #[serde(rename = "originalFileName")]
    pub original_file_name: String,

    /// The image type reported by the provider.
    #[serde(rename = "imageType")]
    pub image_type: String,
}

/// Parse CLOVA OCR JSON into an [`ImageRecord`].
pub fn parse_naver(json: &str) -> Result<ImageRecord> {
    let doc = serde_json::from_str::<NaverDocument>(json)
        .context("failed to parse Naver OCR JSON")?;
    Ok(doc.to_record())
}

/// Load CLOVA OCR JSON from `path` and normalize it.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_naver(path: &Path) -> Result<ImageRecord> {
    let doc = read_json::<NaverDocument>(path).await?;
    let record = doc.to_record();
    debug!(count = record.annotations.len(), "Loaded Naver annotations");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: Value) -> ImageRecord {
        parse_naver(&value.to_string()).unwrap()
    }

    #[test]
    fn test_field_is_normalized_to_floats() {
        let record = parse(json!({
            "images": [{
                "fields": [{
                    "inferText": "안녕",
                    "boundingPoly": { "vertices": [{ "x": 0, "y": 0 }, { "x": 10, "y": 20 }] },
                }],
            }],
        }));
        assert_eq!(
            record.annotations,
            vec![Annotation {
                text: "안녕".to_owned(),
                left: Coord::Float(0.0),
                top: Coord::Float(0.0),
                width: Coord::Float(10.0),
                height: Coord::Float(20.0),
            }]
        );
        let json = serde_json::to_string(&record.annotations[0]).unwrap();
        assert_eq!(
            json,
            r#"{"text":"안녕","left":0.0,"top":0.0,"width":10.0,"height":20.0}"#
        );
    }

    #[test]
    fn test_image_url() {
        let record = parse(json!({ "originalFileName": "img1" }));
        assert_eq!(record.image_url, "/static/img1.jpg");

        let record = parse(json!({ "originalFileName": "" }));
        assert_eq!(record.image_url, "");

        let record = parse(json!({}));
        assert_eq!(record.image_url, "");
        assert_eq!(record.original_file_name, "");
    }

    #[test]
    fn test_image_url_ignores_image_type() {
        let record = parse(json!({ "originalFileName": "scan", "imageType": "png" }));
        assert_eq!(record.image_url, "/static/scan.jpg");
        assert_eq!(record.image_type, "png");
    }

    #[test]
    fn test_image_type_defaults_to_jpg() {
        assert_eq!(parse(json!({})).image_type, "jpg");
        assert_eq!(parse(json!({ "imageType": null })).image_type, "jpg");
    }

    #[test]
    fn test_missing_images_and_empty_fields() {
        assert!(parse(json!({})).annotations.is_empty());
        let record = parse(json!({
            "images": [
                { "fields": [
                    { "inferText": "no poly" },
                    { "inferText": "no vertices", "boundingPoly": {} },
                    { "boundingPoly": { "vertices": [{ "x": 4 }, { "y": 2.5 }] } },
                ] },
                { "fields": null },
            ],
        }));
        assert_eq!(record.annotations.len(), 1);
        let annotation = &record.annotations[0];
        assert_eq!(annotation.text, "");
        assert_eq!(annotation.width, Coord::Float(4.0));
        assert_eq!(annotation.height, Coord::Float(2.5));
    }

    #[test]
    fn test_record_serializes_provider_field_names() {
        let record = parse(json!({ "originalFileName": "img1" }));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "image_url": "/static/img1.jpg",
                "annotations": [],
                "originalFileName": "img1",
                "imageType": "jpg",
            })
        );
    }
}
