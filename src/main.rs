use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{prelude::*, ui::Ui};

mod cmd;
mod geometry;
mod index;
mod io;
mod prelude;
mod providers;
#[cfg(test)]
mod test_server;
mod translate;
mod ui;
mod web;

/// Compare OCR annotations from Upstage and Naver CLOVA.
#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    after_help = r#"
Environment Variables:
  - UPSTAGE_API_KEY: Upstage key, used by `upload`.
  - PAPAGO_API_KEY_ID (optional): Papago client ID, used by `serve`.
  - PAPAGO_API_KEY (optional): Papago client secret, used by `serve`.

  Without both Papago variables, `serve` runs with translation disabled.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: Cmd,
}

/// The subcommands we support.
#[derive(Debug, Subcommand)]
enum Cmd {
    /// Run the web viewer.
    Serve(cmd::serve::ServeOpts),
    /// Normalize one provider's OCR output.
    Parse(cmd::parse::ParseOpts),
    /// List image IDs in a directory, or the neighbors of one image.
    List(cmd::list::ListOpts),
    /// Send every image in a directory to Upstage for OCR.
    Upload(cmd::upload::UploadOpts),
    /// Print schemas for output formats.
    Schema(cmd::schema::SchemaOpts),
}

impl Cmd {
    /// Are we using stdout for output?
    fn using_stdout_for_output(&self) -> bool {
        match self {
            Cmd::Serve(_) | Cmd::Upload(_) => false,
            Cmd::Parse(opts) => opts.output_path.is_none(),
            Cmd::List(_) => true,
            Cmd::Schema(opts) => opts.output_path.is_none(),
        }
    }
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);

    tracing_subscriber::registry().with(subscriber).init();

    // Call our real `main` function now that logging is set up.
    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    // Hide the progress bar if we're using stdout for output.
    if opts.subcmd.using_stdout_for_output() {
        ui.hide_progress_bars();
    }

    // Run the appropriate subcommand.
    match &opts.subcmd {
        Cmd::Serve(serve_opts) => {
            cmd::serve::cmd_serve(serve_opts).await?;
        }
        Cmd::Parse(parse_opts) => {
            cmd::parse::cmd_parse(parse_opts).await?;
        }
        Cmd::List(list_opts) => {
            cmd::list::cmd_list(list_opts).await?;
        }
        Cmd::Upload(upload_opts) => {
            cmd::upload::cmd_upload(ui, upload_opts).await?;
        }
        Cmd::Schema(schema_opts) => {
            cmd::schema::cmd_schema(schema_opts).await?;
        }
    }
    Ok(())
}
