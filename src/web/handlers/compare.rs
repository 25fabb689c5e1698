//! Image browsing handlers.

use axum::{
    extract::{Path as UrlPath, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use crate::{
    index::adjacency,
    prelude::*,
    providers::{Provider, load_naver, load_upstage},
    web::{
        AppState, compare_path,
        error::ViewerError,
        render::{ComparePage, UpstagePanel},
        static_image_path,
    },
};

/// Redirect to the first image.
///
/// GET /
#[instrument(level = "debug", skip_all)]
pub async fn first_image(State(state): State<AppState>) -> Result<Response, ViewerError> {
    let images = state.images.clone().load().await?;
    let first = images.first().ok_or(ViewerError::NoImages)?;
    let location = compare_path(first);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Show both providers' annotations for one image.
///
/// GET /compare/{image_id}
#[instrument(level = "debug", skip(state))]
pub async fn compare_image(
    State(state): State<AppState>,
    UrlPath(image_id): UrlPath<String>,
) -> Result<Html<String>, ViewerError> {
    let images = state.images.clone().load().await?;
    let neighbors = match adjacency(&images, &image_id) {
        // A cached listing may predate this image, so look once more.
        Err(_) if state.images.invalidate() => {
            let images = state.images.clone().load().await?;
            adjacency(&images, &image_id)?
        }
        result => result?,
    };

    let upstage_path = ocr_file(&state, Provider::Upstage, &image_id).await?;
    let naver_path = ocr_file(&state, Provider::Naver, &image_id).await?;
    let upstage = load_upstage(&upstage_path).await?;
    let naver = load_naver(&naver_path).await?;

    let page = ComparePage {
        image_id: &image_id,
        upstage: UpstagePanel {
            image_url: static_image_path(&image_id),
            annotations: &upstage,
        },
        naver: &naver,
        prev_name: neighbors.prev.as_deref(),
        prev_url: neighbors.prev.as_deref().map(compare_path),
        next_name: neighbors.next.as_deref(),
        next_url: neighbors.next.as_deref().map(compare_path),
    };
    Ok(Html(state.pages.render_compare(&page)?))
}

/// Find the OCR file for `provider`, or report which one is missing.
async fn ocr_file(
    state: &AppState,
    provider: Provider,
    image_id: &str,
) -> Result<PathBuf, ViewerError> {
    let path = state.data_dir.join(provider.file_name(image_id));
    let is_file = tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.is_file());
    if is_file {
        Ok(path)
    } else {
        debug!(path = %path.display(), "OCR file not found");
        Err(ViewerError::NotFound(format!(
            "{} JSON file not found for image {image_id}",
            provider.display_name(),
        )))
    }
}
