//! CLI module for the user lifecycle service
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `openapi`: print the OpenAPI document

pub mod openapi;
pub mod serve;

use clap::{Parser, Subcommand};

/// User lifecycle API - create, replace, patch and read user records
#[derive(Parser)]
#[command(name = "user-lifecycle-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Print the OpenAPI document as JSON
    Openapi(openapi::OpenapiArgs),
}
