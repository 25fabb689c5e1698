//! The `parse` subcommand.

use clap::Args;

use crate::{
    io::{read_text, write_json_pretty},
    prelude::*,
    providers::{Provider, parse_naver, parse_upstage},
};

/// Options for normalizing a single provider file.
#[derive(Debug, Args)]
pub struct ParseOpts {
    /// The provider which produced the file.
    #[clap(value_enum)]
    pub provider: Provider,

    /// The provider's JSON output.
    pub input_path: PathBuf,

    /// Where to write normalized JSON. Defaults to standard output.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// The `parse` subcommand.
#[instrument(level = "debug", skip_all, fields(provider = ?opts.provider))]
pub async fn cmd_parse(opts: &ParseOpts) -> Result<()> {
    let output_path = opts.output_path.as_deref();
    let json = read_text(&opts.input_path).await?;
    let context = || format!("Failed to normalize {:?}", opts.input_path);
    match opts.provider {
        Provider::Upstage => {
            let annotations = parse_upstage(&json).with_context(context)?;
            debug!(count = annotations.len(), "Parsed Upstage annotations");
            write_json_pretty(output_path, &annotations).await
        }
        Provider::Naver => {
            let record = parse_naver(&json).with_context(context)?;
            debug!(count = record.annotations.len(), "Parsed Naver annotations");
            write_json_pretty(output_path, &record).await
        }
    }
}
