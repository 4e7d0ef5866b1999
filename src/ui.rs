use colored::Colorize;
use declarative::{PropertyMap, PropertyValue};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

// ============================================================================
// Property Formatting
// ============================================================================

/// Placeholder shown for values only known after apply
pub const COMPUTED: &str = "[computed]";

/// Format a property value on one line
pub fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Number(n) => format_number(*n),
        PropertyValue::String(s) => format!("{s:?}"),
        PropertyValue::Computed => COMPUTED.to_string(),
        PropertyValue::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", format_value(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Print stack outputs, nesting objects one level per indent
pub fn print_outputs(outputs: &PropertyMap) {
    if outputs.is_empty() {
        dim("(no outputs)");
        return;
    }
    print_map(outputs, 1);
}

fn print_map(map: &PropertyMap, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in map.iter() {
        match value {
            PropertyValue::Object(inner) if !inner.is_empty() => {
                println!("{indent}{}:", key.bold());
                print_map(inner, depth + 1);
            }
            PropertyValue::Computed => {
                println!("{indent}{}: {}", key.bold(), COMPUTED.dimmed());
            }
            other => println!("{indent}{}: {}", key.bold(), format_value(other)),
        }
    }
}

/// Truncate a string for display, keeping the start
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = text.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

// ============================================================================
// Tests
// ============================================================================
