//! OpenAPI command - prints the API document to stdout

use clap::Args;
use utoipa::OpenApi;

use crate::api::ApiDoc;

/// Arguments for the openapi command
#[derive(Args, Clone, Debug)]
pub struct OpenapiArgs {
    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Print the OpenAPI document
pub fn run(args: OpenapiArgs) -> anyhow::Result<()> {
    println!("{}", render(&args)?);
    Ok(())
}

fn render(args: &OpenapiArgs) -> anyhow::Result<String> {
    let doc = ApiDoc::openapi();

    let json = if args.compact {
        doc.to_json()?
    } else {
        doc.to_pretty_json()?
    };

    Ok(json)
}
