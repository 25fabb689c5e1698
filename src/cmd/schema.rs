//! The `schema` subcommand.

use clap::{Args, ValueEnum};
use schemars::schema_for;

use crate::{
    index::Adjacency,
    io::write_json_pretty,
    prelude::*,
    providers::{Annotation, AnnotationSet, ImageRecord},
};

/// The different schema types we support.
///
/// We parse these as PascalCase, because they represent type names.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "PascalCase")]
pub enum SchemaType {
    /// A single normalized annotation.
    Annotation,
    /// Normalized Upstage output (`parse upstage`).
    AnnotationSet,
    /// Normalized Naver output (`parse naver`).
    ImageRecord,
    /// Neighbors of an image (`list --around`).
    Adjacency,
}

/// Schema command line arguments.
#[derive(Debug, Args)]
pub struct SchemaOpts {
    /// The schema type to generate.
    #[clap(value_enum, value_name = "TYPE")]
    pub schema_type: SchemaType,

    /// The output path to write the schema to.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// The `schema` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_schema(schema_opts: &SchemaOpts) -> Result<()> {
    let schema = match schema_opts.schema_type {
        SchemaType::Annotation => schema_for!(Annotation),
        SchemaType::AnnotationSet => schema_for!(AnnotationSet),
        SchemaType::ImageRecord => schema_for!(ImageRecord),
        SchemaType::Adjacency => schema_for!(Adjacency),
    };
    write_json_pretty(schema_opts.output_path.as_deref(), &schema).await
}
