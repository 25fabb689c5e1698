//! OCR provider output, normalized into a single annotation model.
//!
//! Each provider has its own ad hoc JSON schema. We decode each one
//! permissively: missing keys (and `null` values) fall back to documented
//! defaults instead of failing, because these files come straight from
//! third-party APIs and we would rather show a partial result than nothing.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};

use crate::{
    geometry::{BoundingBox, Coord, Vertex, reduce},
    prelude::*,
};

pub mod naver;
pub mod upstage;

pub use self::{
    naver::{ImageRecord, load_naver, parse_naver},
    upstage::{load_upstage, parse_upstage},
};

/// One recognized text region, ready to draw over an image.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Annotation {
    /// The recognized text. May be empty.
    pub text: String,

    /// Left edge, in image pixels.
    pub left: Coord,

    /// Top edge, in image pixels.
    pub top: Coord,

    /// Width, in image pixels. Never negative.
    pub width: Coord,

    /// Height, in image pixels. Never negative.
    pub height: Coord,
}

impl Annotation {
    /// Build an annotation from a text and the bounding box of its polygon.
    pub fn new(text: impl Into<String>, bbox: BoundingBox<Coord>) -> Self {
        Self {
            text: text.into(),
            left: bbox.left,
            top: bbox.top,
            width: bbox.width,
            height: bbox.height,
        }
    }

    /// Build an annotation around `vertices`, or `None` if there are no
    /// vertices at all.
    pub fn from_vertices(
        text: &str,
        vertices: impl IntoIterator<Item = Vertex<Coord>>,
    ) -> Option<Self> {
        reduce(vertices).map(|bbox| Self::new(text, bbox))
    }
}

/// The annotations for one image from one provider, in source order.
pub type AnnotationSet = Vec<Annotation>;

/// A provider document which can be normalized into annotations.
pub trait AnnotationSource {
    /// Extract annotations, skipping any text region without vertices.
    fn annotations(&self) -> AnnotationSet;
}

/// The OCR providers we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum Provider {
    /// Upstage document OCR (`pages` / `lines` / `boundingBox`).
    Upstage,
    /// Naver CLOVA OCR (`images` / `fields` / `boundingPoly`).
    Naver,
}

impl Provider {
    /// The name of the JSON file holding this provider's output for `id`.
    pub fn file_name(self, id: &str) -> String {
        match self {
            Provider::Upstage => format!("{id}_upstage.json"),
            Provider::Naver => format!("{id}_naver.json"),
        }
    }

    /// A human-readable provider name.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Upstage => "Upstage",
            Provider::Naver => "Naver",
        }
    }
}

/// Deserialize a value, treating `null` like a missing key.
///
/// Use together with `#[serde(default)]`.
pub(crate) fn default_on_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
