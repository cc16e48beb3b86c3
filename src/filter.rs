//! Tag filter model and the `key:value` parser.
//!
//! Raw entries come from the CLI as `key:value` strings. The value side is
//! either a single scalar string or a bracketed list literal like
//! `['bar','baz']`, which turns the constraint into a value set (membership
//! match). Parsing is restricted to exactly that grammar: a value that does
//! not parse as a bracketed list stays one scalar string, empty strings and
//! number-looking strings included. There is no expression evaluation.

use anyhow::{bail, Result};

/// One constraint: the tag value under `key` must be a member of `values`.
/// A scalar filter becomes a one-element `values`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagConstraint {
    pub key: String,
    pub values: Vec<String>,
}

/// Ordered list of constraints. AND across distinct keys; OR within one
/// key's value set. See `select::select_volumes` for the match rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub constraints: Vec<TagConstraint>,
}

impl TagFilter {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Distinct keys in first-appearance order, each with the union of its
    /// allowed values. Repeated keys are not coalesced in `constraints`;
    /// matching uses this union view.
    pub fn merged_by_key(&self) -> Vec<(&str, Vec<&str>)> {
        let mut merged: Vec<(&str, Vec<&str>)> = Vec::new();
        for c in &self.constraints {
            match merged.iter_mut().find(|(k, _)| *k == c.key) {
                Some((_, vals)) => vals.extend(c.values.iter().map(String::as_str)),
                None => merged.push((&c.key, c.values.iter().map(String::as_str).collect())),
            }
        }
        merged
    }

    /// Every (key, value) pair implied by the filter, value sets expanded.
    /// This flattened view drives the inverted (deny-list) match.
    pub fn flattened_pairs(&self) -> Vec<(&str, &str)> {
        self.constraints
            .iter()
            .flat_map(|c| c.values.iter().map(move |v| (c.key.as_str(), v.as_str())))
            .collect()
    }
}

/// Parse raw `key:value` entries into a TagFilter.
///
/// Splits at the first colon only, so values may themselves contain colons.
/// An entry without a colon is a configuration error and aborts the whole
/// parse; no partial filter is ever returned.
pub fn parse_filters<S: AsRef<str>>(raw: &[S]) -> Result<TagFilter> {
    let mut constraints = Vec::with_capacity(raw.len());
    for entry in raw {
        let entry = entry.as_ref();
        let Some((key, value)) = entry.split_once(':') else {
            bail!("malformed tag filter '{entry}': expected key:value");
        };
        let values = match parse_list_literal(value) {
            Some(items) => items,
            None => vec![value.to_string()],
        };
        constraints.push(TagConstraint {
            key: key.to_string(),
            values,
        });
    }
    Ok(TagFilter { constraints })
}

/// Try to read `value` as a bracketed comma-separated list of strings,
/// items optionally quoted with ' or ". Returns None when the value is not
/// a well-formed list, in which case the caller keeps it as a scalar.
fn parse_list_literal(value: &str) -> Option<Vec<String>> {
    let inner = value
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut items = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        let unquoted = strip_matching_quotes(item)?;
        items.push(unquoted.to_string());
    }
    Some(items)
}

fn strip_matching_quotes(item: &str) -> Option<&str> {
    if item.len() >= 2 {
        let bytes = item.as_bytes();
        if (bytes[0] == b'\'' && bytes[item.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[item.len() - 1] == b'"')
        {
            return Some(&item[1..item.len() - 1]);
        }
    }
    // Unquoted items are allowed as long as they carry no stray quote.
    if item.contains('\'') || item.contains('"') {
        return None;
    }
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_entry() {
        let f = parse_filters(&["name:foo"]).unwrap();
        assert_eq!(f.constraints.len(), 1);
        assert_eq!(f.constraints[0].key, "name");
        assert_eq!(f.constraints[0].values, vec!["foo"]);
    }

    #[test]
    fn list_entry() {
        let f = parse_filters(&["name:['bar','baz']"]).unwrap();
        assert_eq!(f.constraints[0].values, vec!["bar", "baz"]);
    }

    #[test]
    fn double_quoted_and_unquoted_items() {
        let f = parse_filters(&[r#"env:["prod", staging]"#]).unwrap();
        assert_eq!(f.constraints[0].values, vec!["prod", "staging"]);
    }

    #[test]
    fn value_with_colon_splits_once() {
        let f = parse_filters(&["arn:aws:ec2"]).unwrap();
        assert_eq!(f.constraints[0].key, "arn");
        assert_eq!(f.constraints[0].values, vec!["aws:ec2"]);
    }

    #[test]
    fn empty_and_numeric_values_stay_scalar() {
        let f = parse_filters(&["name:", "count:42"]).unwrap();
        assert_eq!(f.constraints[0].values, vec![""]);
        assert_eq!(f.constraints[1].values, vec!["42"]);
    }

    #[test]
    fn malformed_list_stays_scalar() {
        // Missing closing bracket, and a stray quote: not the list grammar.
        let f = parse_filters(&["name:['bar'", "other:ba'z"]).unwrap();
        assert_eq!(f.constraints[0].values, vec!["['bar'"]);
        assert_eq!(f.constraints[1].values, vec!["ba'z"]);
    }

    #[test]
    fn no_colon_is_an_error() {
        assert!(parse_filters(&["namefoo"]).is_err());
        // One bad entry poisons the whole parse.
        assert!(parse_filters(&["name:foo", "bad"]).is_err());
    }

    #[test]
    fn repeated_keys_union_in_merged_view() {
        let f = parse_filters(&["name:foo", "name:['bar']"]).unwrap();
        assert_eq!(f.constraints.len(), 2);
        let merged = f.merged_by_key();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].1, vec!["foo", "bar"]);
    }

    #[test]
    fn flattened_pairs_expand_value_sets() {
        let f = parse_filters(&["name:['bar','baz']", "customer:acme"]).unwrap();
        assert_eq!(
            f.flattened_pairs(),
            vec![("name", "bar"), ("name", "baz"), ("customer", "acme")]
        );
    }
}
