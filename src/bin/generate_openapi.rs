//! Writes the service's OpenAPI document as JSON.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::io::Write;
use std::{env, fs, io};

use anyhow::{Context, Result};
use geotrack_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("failed to serialise OpenAPI document")?;

    let args: Vec<String> = env::args().collect();
    let output = args
        .windows(2)
        .find(|pair| pair[0] == "--output")
        .map(|pair| pair[1].clone());

    match output {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("failed to write {path}"))?;
            eprintln!("OpenAPI document written to {path}");
        }
        None => io::stdout().write_all(json.as_bytes())?,
    }
    Ok(())
}
