//! Stack outputs

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{PropertyMap, PropertyValue};

use super::Session;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, name: Option<&str>, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;

    let Some(state) = session.store.load_state(&session.stack)? else {
        bail!(
            "Stack '{}' has not been deployed; run `up` first",
            session.stack
        );
    };
    let outputs = state.snapshot.outputs;

    if name.is_none() && !json {
        ui::header(&format!(
            "Outputs of {} ({})",
            session.project(),
            session.stack
        ));
        ui::print_outputs(&outputs);
        return Ok(());
    }

    println!("{}", render(&outputs, name, json)?);
    Ok(())
}

/// Render all outputs or a single one; a plain string prints unquoted
pub fn render(outputs: &PropertyMap, name: Option<&str>, json: bool) -> Result<String> {
    let value = match name {
        Some(name) => outputs
            .get(name)
            .cloned()
            .with_context(|| format!("No output named '{name}'"))?,
        None => PropertyValue::Object(outputs.clone()),
    };

    if json {
        return serde_json::to_string_pretty(&value.to_json())
            .context("Failed to serialize outputs to JSON");
    }

    Ok(match value {
        PropertyValue::String(s) => s,
        other => ui::format_value(&other),
    })
}
