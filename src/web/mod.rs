//! The comparison web viewer.
//!
//! Routes:
//!
//! - `GET /` redirects to the first image.
//! - `GET /compare/{id}` shows both providers' annotations for one image.
//! - `GET /translate?text=...` translates a snippet of recognized text.
//! - `GET /static/...` serves the images themselves.

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use url::Url;

use crate::{index::ImageIndex, prelude::*, translate::Translator};

use self::render::PageRenderer;

pub mod error;
pub mod handlers;
pub mod render;
pub mod routes;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Directory holding `{id}.jpg` images, served under `/static`.
    pub static_dir: Arc<PathBuf>,

    /// Directory holding `{id}_upstage.json` and `{id}_naver.json`.
    pub data_dir: Arc<PathBuf>,

    /// The images we can browse.
    pub images: Arc<ImageIndex>,

    /// Our translator, if credentials were available.
    pub translator: Option<Arc<dyn Translator>>,

    /// Page templates.
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    /// Create state for the given directories, without a translator.
    pub fn new(static_dir: PathBuf, data_dir: PathBuf, cache_index: bool) -> Result<Self> {
        let images = ImageIndex::new(static_dir.clone(), cache_index);
        Ok(Self {
            static_dir: Arc::new(static_dir),
            data_dir: Arc::new(data_dir),
            images: Arc::new(images),
            translator: None,
            pages: Arc::new(PageRenderer::new()?),
        })
    }

    /// Use `translator` for `/translate`.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }
}

/// The path of the comparison page for `image_id`.
pub fn compare_path(image_id: &str) -> String {
    segment_path("compare", image_id)
}

/// The path of the image file for `image_id`.
pub fn static_image_path(image_id: &str) -> String {
    segment_path("static", &format!("{image_id}.jpg"))
}

/// Build `/{dir}/{name}`, percent-encoding `name` as one path segment.
fn segment_path(dir: &str, name: &str) -> String {
    let mut url = Url::parse("http://localhost/").expect("built-in base URL should be valid");
    url.path_segments_mut()
        .expect("http URLs always have a path")
        .clear()
        .push(dir)
        .push(name);
    url.path().to_owned()
}

/// Serve the viewer on `addr` until Ctrl-C.
#[instrument(level = "debug", skip(state))]
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = routes::router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("OCR comparison viewer listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl-C: {err}");
                // Never resolve, so we keep serving.
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .context("web server failed")?;

    info!("OCR comparison viewer stopped");
    Ok(())
}
