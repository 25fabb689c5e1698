//! HTML rendering for the comparison page.

use handlebars::Handlebars;

use crate::{
    providers::{AnnotationSet, ImageRecord},
    prelude::*,
};

/// Name of the comparison template.
const COMPARE_TEMPLATE: &str = "compare";

/// Source of the comparison template.
const COMPARE_TEMPLATE_SOURCE: &str = include_str!("templates/compare.hbs");

/// Everything shown on one comparison page.
#[derive(Debug, Serialize)]
pub struct ComparePage<'a> {
    /// The image being compared.
    pub image_id: &'a str,

    /// Upstage annotations, drawn over [`UpstagePanel::image_url`].
    pub upstage: UpstagePanel<'a>,

    /// Naver annotations and image metadata.
    pub naver: &'a ImageRecord,

    /// The previous image, if any.
    pub prev_name: Option<&'a str>,

    /// Link to the previous image, already percent-encoded.
    pub prev_url: Option<String>,

    /// The next image, if any.
    pub next_name: Option<&'a str>,

    /// Link to the next image, already percent-encoded.
    pub next_url: Option<String>,
}

/// The Upstage half of a [`ComparePage`].
#[derive(Debug, Serialize)]
pub struct UpstagePanel<'a> {
    pub image_url: String,
    pub annotations: &'a AnnotationSet,
}

/// Renders viewer pages from built-in templates.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    /// Create a renderer and compile our templates.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(COMPARE_TEMPLATE, COMPARE_TEMPLATE_SOURCE)
            .context("failed to compile comparison template")?;
        Ok(Self { handlebars })
    }

    /// Render a comparison page.
    pub fn render_compare(&self, page: &ComparePage<'_>) -> Result<String> {
        self.handlebars
            .render(COMPARE_TEMPLATE, page)
            .with_context(|| format!("failed to render comparison page for {:?}", page.image_id))
    }
}
