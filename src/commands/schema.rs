//! Package schema

use anyhow::{Context, Result};

pub fn run() -> Result<()> {
    println!("{}", render()?);
    Ok(())
}

fn render() -> Result<String> {
    let schema = statefulstring_provider::provider().schema();
    serde_json::to_string_pretty(&schema).context("Failed to serialize schema")
}
