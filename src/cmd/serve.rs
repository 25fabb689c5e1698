//! The `serve` subcommand.

use std::{net::SocketAddr, sync::Arc};

use clap::Args;

use crate::{
    prelude::*,
    translate::{PapagoTranslator, TranslateOpts},
    web::{self, AppState},
};

/// Web viewer options.
#[derive(Debug, Args)]
pub struct ServeOpts {
    /// Address to listen on.
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[clap(short = 'p', long, default_value = "8080")]
    pub port: u16,

    /// Directory of `.jpg` images to browse, also served at `/static`.
    #[clap(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory of `{id}_upstage.json` and `{id}_naver.json` files.
    #[clap(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Reuse the image listing until the static directory changes, instead of
    /// rescanning it on every request.
    #[clap(long)]
    pub cache_index: bool,

    #[clap(flatten)]
    pub translate: TranslateOpts,
}

/// The `serve` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_serve(opts: &ServeOpts) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", opts.host, opts.port))?;

    if !opts.static_dir.is_dir() {
        warn!(dir = %opts.static_dir.display(), "Static directory does not exist");
    }
    if !opts.data_dir.is_dir() {
        warn!(dir = %opts.data_dir.display(), "Data directory does not exist");
    }

    let mut state = AppState::new(
        opts.static_dir.clone(),
        opts.data_dir.clone(),
        opts.cache_index,
    )?;
    match PapagoTranslator::from_env(&opts.translate) {
        Ok(translator) => {
            info!(
                source = %opts.translate.source_lang,
                target = %opts.translate.target_lang,
                "Papago translation enabled",
            );
            state = state.with_translator(Arc::new(translator));
        }
        Err(err) => warn!("Translation disabled: {err:#}"),
    }

    web::serve(addr, state).await
}
