//! The `upload` subcommand.
//!
//! Sends every file in the static directory to Upstage document
//! digitization and stores each response as `{stem}_upstage_doc.json` in the
//! data directory. Rejected files are logged and skipped, so one bad image
//! doesn't stop the batch.

use std::{env, fs, sync::Arc};

use clap::Args;
use futures::{StreamExt as _, TryStreamExt as _, stream};
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};

use crate::{
    prelude::*,
    ui::{ProgressConfig, Ui},
};

/// The Upstage document digitization endpoint.
pub const UPSTAGE_DIGITIZATION_URL: &str =
    "https://api.upstage.ai/v1/document-digitization";

/// Environment variable holding the Upstage API key.
pub const UPSTAGE_API_KEY_VAR: &str = "UPSTAGE_API_KEY";

/// Output formats we ask Upstage for.
const OUTPUT_FORMATS: &str = r#"["html", "markdown", "text"]"#;

/// Suffix for stored responses.
const OUTPUT_SUFFIX: &str = "_upstage_doc.json";

/// Upload options.
#[derive(Debug, Args)]
pub struct UploadOpts {
    /// Directory of images to upload.
    #[clap(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory to store responses in.
    #[clap(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Max number of uploads to run at a time.
    #[clap(short = 'j', long = "jobs", default_value = "1")]
    pub job_count: usize,

    /// The Upstage document digitization endpoint.
    #[clap(long, default_value = UPSTAGE_DIGITIZATION_URL, hide = true)]
    pub upstage_url: String,
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The response was stored at this path.
    Saved(PathBuf),
    /// Upstage refused the file.
    Rejected(StatusCode),
}

/// Client for Upstage document digitization.
pub struct UpstageUploader {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl UpstageUploader {
    /// Create a new uploader.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: UPSTAGE_DIGITIZATION_URL.to_owned(),
            api_key,
        }
    }

    /// Send requests to `url` instead of the public endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Upload one file, storing a successful response in `data_dir`.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn upload(&self, path: &Path, data_dir: &Path) -> Result<UploadOutcome> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file at path: {:?}", path))?;

        let form = Form::new()
            .text("ocr", "force")
            .text("model", "document-parse")
            .text("output_formats", OUTPUT_FORMATS)
            .part("document", Part::bytes(data).file_name(file_name.clone()));
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to upload {file_name}"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response for {file_name}"))?;
        if status != StatusCode::OK {
            warn!(
                file = %file_name,
                %status,
                body = %String::from_utf8_lossy(&body),
                "Failed to upload",
            );
            return Ok(UploadOutcome::Rejected(status));
        }

        let stored = output_path(data_dir, path);
        tokio::fs::write(&stored, &body)
            .await
            .with_context(|| format!("Failed to write file at path: {:?}", stored))?;
        debug!(output = %stored.display(), "Stored Upstage response");
        Ok(UploadOutcome::Saved(stored))
    }
}

/// Where to store the response for `input`.
pub fn output_path(data_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    data_dir.join(format!("{stem}{OUTPUT_SUFFIX}"))
}

/// The files in `dir` to upload, sorted. Subdirectories and hidden files are
/// skipped.
pub fn upload_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?;
    let mut paths = vec![];
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory {:?}", dir))?
            .path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if path.is_file() && !hidden {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// The `upload` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_upload(ui: Ui, opts: &UploadOpts) -> Result<()> {
    let api_key = env::var(UPSTAGE_API_KEY_VAR)
        .with_context(|| format!("{UPSTAGE_API_KEY_VAR} is not set"))?;
    let uploader = UpstageUploader::new(api_key).with_url(&opts.upstage_url);

    let paths = upload_candidates(&opts.static_dir)?;
    tokio::fs::create_dir_all(&opts.data_dir)
        .await
        .with_context(|| format!("Failed to create directory {:?}", opts.data_dir))?;

    let outcomes =
        upload_all(&ui, uploader, paths, &opts.data_dir, opts.job_count).await?;
    let rejected = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, UploadOutcome::Rejected(_)))
        .count();
    info!(
        saved = outcomes.len() - rejected,
        rejected, "Finished uploading images"
    );
    Ok(())
}

/// Upload `paths`, running up to `job_count` uploads at once.
///
/// Rejected files show up as [`UploadOutcome::Rejected`] and don't stop the
/// rest of the batch.
pub async fn upload_all(
    ui: &Ui,
    uploader: UpstageUploader,
    paths: Vec<PathBuf>,
    data_dir: &Path,
    job_count: usize,
) -> Result<Vec<UploadOutcome>> {
    let uploader = Arc::new(uploader);
    let pb = ui.new_progress_bar(
        &ProgressConfig {
            emoji: "📤",
            msg: "Uploading images",
            done_msg: "Uploaded images",
        },
        paths.len() as u64,
    );

    let data_dir = Arc::new(data_dir.to_owned());
    let uploads = stream::iter(paths).map(|path| {
        let uploader = uploader.clone();
        let data_dir = data_dir.clone();
        async move { uploader.upload(&path, &data_dir).await }
    });
    pb.wrap_stream(uploads.buffer_unordered(job_count.max(1)))
        .try_collect::<Vec<_>>()
        .await
}

#[cfg(test)]
mod tests {
    use crate::test_server::MockServer;

    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("data"), Path::new("static/page 1.jpg")),
            Path::new("data/page 1_upstage_doc.json"),
        );
    }

    #[test]
    fn test_upload_candidates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.png", ".DS_Store"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        let names = upload_candidates(dir.path())
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.png", "b.jpg"]);
    }

    /// Answers 400 for `bad.jpg` and 200 with a small document otherwise.
    async fn upstage_server() -> MockServer {
        MockServer::start(|request| {
            if request.body_text().contains(r#"filename="bad.jpg""#) {
                (StatusCode::BAD_REQUEST, r#"{"error":"unsupported"}"#.to_owned())
            } else {
                (StatusCode::OK, r#"{"pages":[]}"#.to_owned())
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_upload_sends_document_and_stores_response() {
        let server = upstage_server().await;
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        fs::write(&image, b"\xff\xd8\xff").unwrap();

        let uploader = UpstageUploader::new("test-key".to_owned())
            .with_url(server.url("/v1/document-digitization"));
        let outcome = uploader.upload(&image, dir.path()).await.unwrap();
        let stored = dir.path().join("a_upstage_doc.json");
        assert_eq!(outcome, UploadOutcome::Saved(stored.clone()));
        assert_eq!(fs::read_to_string(&stored).unwrap(), r#"{"pages":[]}"#);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, "/v1/document-digitization");
        assert_eq!(request.header("authorization"), Some("Bearer test-key"));
        assert!(
            request
                .header("content-type")
                .is_some_and(|value| value.starts_with("multipart/form-data"))
        );
        let body = request.body_text();
        assert!(body.contains(r#"name="document"; filename="a.jpg""#));
        for (name, value) in [
            ("ocr", "force"),
            ("model", "document-parse"),
            ("output_formats", OUTPUT_FORMATS),
        ] {
            assert!(body.contains(&format!("name=\"{name}\"\r\n\r\n{value}\r\n")));
        }
    }

    #[tokio::test]
    async fn test_upload_all_continues_after_rejection() {
        let server = upstage_server().await;
        let static_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "bad.jpg", "c.jpg"] {
            fs::write(static_dir.path().join(name), b"\xff\xd8\xff").unwrap();
        }

        let uploader = UpstageUploader::new("test-key".to_owned())
            .with_url(server.url("/v1/document-digitization"));
        let paths = upload_candidates(static_dir.path()).unwrap();
        let outcomes = upload_all(&Ui::init(), uploader, paths, data_dir.path(), 1)
            .await
            .unwrap();

        assert_eq!(server.requests().len(), 3);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.contains(&UploadOutcome::Rejected(StatusCode::BAD_REQUEST)));
        assert!(data_dir.path().join("a_upstage_doc.json").is_file());
        assert!(data_dir.path().join("c_upstage_doc.json").is_file());
        assert!(!data_dir.path().join("bad_upstage_doc.json").exists());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        fs::write(&image, b"\xff\xd8\xff").unwrap();
        let uploader = UpstageUploader::new("key".to_owned())
            .with_url("http://127.0.0.1:9/v1/document-digitization");
        assert!(uploader.upload(&image, dir.path()).await.is_err());
        assert!(!output_path(dir.path(), &image).exists());
    }
}
