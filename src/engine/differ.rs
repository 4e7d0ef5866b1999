//! Plan and diff display

use crate::ui;
use colored::{ColoredString, Colorize};
use declarative::{DiffKind, Plan, PropertyMap, PropertyValue, Step, StepOp};
use std::collections::BTreeMap;

/// One changed property of a step
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub path: String,
    pub kind: DiffKind,
    pub old: Option<PropertyValue>,
    pub new: Option<PropertyValue>,
}

/// The property changes a step would make
pub fn property_changes(step: &Step) -> Vec<PropertyChange> {
    match step.op {
        StepOp::Same | StepOp::Delete => Vec::new(),
        StepOp::Create => step
            .inputs
            .iter()
            .map(|(key, value)| PropertyChange {
                path: key.clone(),
                kind: DiffKind::Add,
                old: None,
                new: Some(value.clone()),
            })
            .collect(),
        StepOp::Update | StepOp::Replace => {
            let Some(diff) = &step.diff else {
                return Vec::new();
            };
            let olds = step.prior.as_ref().map(|p| &p.outputs);
            diff.detailed_diff
                .iter()
                .map(|(path, d)| PropertyChange {
                    path: path.clone(),
                    kind: d.kind,
                    old: olds.and_then(|o| lookup_path(o, path)).cloned(),
                    new: lookup_path(&step.inputs, path).cloned(),
                })
                .collect()
        }
    }
}

/// Walk a dotted path such as `triggers.foo` through nested objects
pub fn lookup_path<'a>(map: &'a PropertyMap, path: &str) -> Option<&'a PropertyValue> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }
    let (head, rest) = path.split_once('.')?;
    lookup_path(map.object(head)?, rest)
}

fn op_symbol(op: StepOp) -> ColoredString {
    match op {
        StepOp::Same => " ".normal(),
        StepOp::Create => "+".green(),
        StepOp::Update => "~".yellow(),
        StepOp::Replace => "+-".magenta(),
        StepOp::Delete => "-".red(),
    }
}

fn kind_symbol(kind: DiffKind) -> ColoredString {
    match kind {
        DiffKind::Add | DiffKind::AddReplace => "+".green(),
        DiffKind::Update | DiffKind::UpdateReplace => "~".yellow(),
        DiffKind::Delete | DiffKind::DeleteReplace => "-".red(),
    }
}

/// Display the planned steps, grouped by resource type
pub fn display_plan(plan: &Plan, show_diff: bool, verbose: bool) {
    let summary = plan.summary();

    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let mut by_type: BTreeMap<String, Vec<&Step>> = BTreeMap::new();
    for step in &plan.steps {
        if step.op.is_change() || verbose {
            by_type
                .entry(step.urn.type_token().to_string())
                .or_default()
                .push(step);
        }
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Planned Changes".bold()
    );
    println!("│");

    for (type_token, steps) in &by_type {
        println!("│ {}", type_token.bold());

        for step in steps {
            let reason = match step.op {
                StepOp::Replace => step.diff.as_ref().map_or_else(
                    || "(type changed)".to_string(),
                    |d| format!("(replace: {})", d.replace_keys().join(", ")),
                ),
                StepOp::Delete => "(will delete)".to_string(),
                StepOp::Same => "(unchanged)".to_string(),
                _ => String::new(),
            };
            println!(
                "│   {:<2} {:<30} {}",
                op_symbol(step.op),
                step.name(),
                reason.dimmed()
            );

            for change in property_changes(step) {
                display_change(&change, show_diff);
            }
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to update, {} to replace, {} to delete, {} unchanged",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().magenta(),
        summary.delete.to_string().red(),
        summary.same
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn display_change(change: &PropertyChange, show_diff: bool) {
    let marker = if change.kind.is_replace() {
        " [forces replacement]".magenta().to_string()
    } else {
        String::new()
    };

    let values = match (&change.old, &change.new) {
        (None, Some(new)) => ui::format_value(new),
        (Some(old), None) => format!("{} → (removed)", ui::format_value(old)),
        (Some(old), Some(new)) => {
            format!("{} → {}", ui::format_value(old), ui::format_value(new))
        }
        (None, None) => String::new(),
    };

    println!(
        "│       {} {}: {}{}",
        kind_symbol(change.kind),
        change.path,
        ui::truncate(&values, 60).dimmed(),
        marker
    );

    if show_diff
        && let (Some(PropertyValue::String(old)), Some(PropertyValue::String(new))) =
            (&change.old, &change.new)
    {
        for line in text_diff(old, new) {
            println!("│         {line}");
        }
    }
}

/// Line diff between two strings, one colored line per change
pub fn text_diff(old: &str, new: &str) -> Vec<String> {
    let diff = similar::TextDiff::from_lines(old, new);
    let mut lines = Vec::new();

    for change in diff.iter_all_changes() {
        let text = change.value().trim_end_matches('\n');
        match change.tag() {
            similar::ChangeTag::Delete => lines.push(format!("- {text}").red().to_string()),
            similar::ChangeTag::Insert => lines.push(format!("+ {text}").green().to_string()),
            similar::ChangeTag::Equal => {}
        }
    }

    lines
}
