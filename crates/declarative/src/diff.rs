//! Property-level diff computation

use crate::property::{PropertyMap, PropertyValue};
use crate::types::{DiffKind, DiffResponse, PropertyDiff};

/// Compare the listed properties of an old state against new inputs
///
/// Only `keys` are compared; outputs that are not inputs never cause a diff.
/// When `replace` is set every change is reported with its replacing kind.
pub fn diff_properties<'a, I>(
    olds: &PropertyMap,
    news: &PropertyMap,
    keys: I,
    replace: bool,
) -> DiffResponse
where
    I: IntoIterator<Item = &'a str>,
{
    let mut response = DiffResponse::default();

    for key in keys {
        let kind = match (present(olds, key), present(news, key)) {
            (None, None) => continue,
            (None, Some(_)) => DiffKind::Add,
            (Some(_), None) => DiffKind::Delete,
            (Some(old), Some(new)) if old == new => continue,
            (Some(_), Some(_)) => DiffKind::Update,
        };

        let kind = if replace { kind.as_replace() } else { kind };
        response
            .detailed_diff
            .insert(key.to_string(), PropertyDiff::new(kind));
    }

    response.has_changes = !response.detailed_diff.is_empty();
    response
}

/// Compare two string-valued maps key by key
///
/// Keys in the result are `{prefix}.{key}`. Returns the entries that were
/// added, changed or removed.
pub fn diff_string_maps<'a, I, J>(prefix: &str, olds: I, news: J) -> Vec<(String, DiffKind)>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
    J: IntoIterator<Item = (&'a String, &'a String)>,
{
    let old_map: std::collections::BTreeMap<&String, &String> = olds.into_iter().collect();
    let new_map: std::collections::BTreeMap<&String, &String> = news.into_iter().collect();
    let mut changes = Vec::new();

    for (key, value) in &new_map {
        match old_map.get(key) {
            None => changes.push((format!("{prefix}.{key}"), DiffKind::Add)),
            Some(old) if old != value => {
                changes.push((format!("{prefix}.{key}"), DiffKind::Update));
            }
            Some(_) => {}
        }
    }

    for key in old_map.keys() {
        if !new_map.contains_key(key) {
            changes.push((format!("{prefix}.{key}"), DiffKind::Delete));
        }
    }

    changes
}

/// A null value is treated the same as a missing one
fn present<'m>(map: &'m PropertyMap, key: &str) -> Option<&'m PropertyValue> {
    map.get(key).filter(|v| !v.is_null())
}
