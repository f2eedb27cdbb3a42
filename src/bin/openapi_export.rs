// Prints the OpenAPI document: cargo run --bin openapi_export > openapi.json

use anyhow::{Context, Result};
use http_error_kit::api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;
    println!("{}", json);
    Ok(())
}
