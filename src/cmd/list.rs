//! The `list` subcommand.

use clap::Args;
use tokio::io::AsyncWriteExt as _;

use crate::{
    index::{adjacency, list_images},
    io::{create_writer, write_json_pretty},
    prelude::*,
};

/// Options for listing images.
#[derive(Debug, Args)]
pub struct ListOpts {
    /// Directory of `.jpg` images.
    #[clap(default_value = "static")]
    pub dir: PathBuf,

    /// Print the previous and next image around this one, instead of the full
    /// list.
    #[clap(long, value_name = "ID")]
    pub around: Option<String>,
}

/// The `list` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_list(opts: &ListOpts) -> Result<()> {
    let ids = list_images(&opts.dir)?;
    if let Some(current) = &opts.around {
        let neighbors = adjacency(&ids, current)?;
        return write_json_pretty(None, &neighbors).await;
    }

    let mut wtr = create_writer(None).await?;
    for id in &ids {
        wtr.write_all(id.as_bytes())
            .await
            .context("failed to write image list")?;
        wtr.write_all(b"\n")
            .await
            .context("failed to write image list")?;
    }
    wtr.flush().await.context("failed to flush image list")?;
    Ok(())
}
