use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::env::EnvLookup;
use crate::model::{RawEnvironment, ResolvedEnvironment};

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").expect("reference pattern should compile"));

/// Substitute `${NAME}` placeholders in every raw value.
///
/// Each placeholder is looked up in the raw (unsubstituted) file values
/// first, then in `ambient`, and becomes an empty string when neither has it.
/// Substitution is a single pass: a replacement that itself contains
/// `${...}` is copied through untouched.
pub fn resolve<L>(raw: &RawEnvironment, ambient: &L) -> ResolvedEnvironment
where
    L: EnvLookup + ?Sized,
{
    raw.iter()
        .map(|(key, value)| (key.to_owned(), substitute(value, raw, ambient)))
        .collect()
}

/// Substitute placeholders in a single value.
pub fn substitute<L>(value: &str, raw: &RawEnvironment, ambient: &L) -> String
where
    L: EnvLookup + ?Sized,
{
    REFERENCE_PATTERN
        .replace_all(value, |captures: &Captures<'_>| {
            let name = &captures[1];
            match raw.get(name) {
                Some(sibling) => sibling.to_owned(),
                None => ambient.lookup(name).unwrap_or_default(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn raw(pairs: &[(&str, &str)]) -> RawEnvironment {
        let mut raw = RawEnvironment::new();
        for (key, value) in pairs {
            raw.insert(*key, *value);
        }
        raw
    }

    #[test]
    fn resolves_sibling_references() {
        let raw = raw(&[("FOO", "bar"), ("BAZ", "${FOO}_baz")]);
        let resolved = resolve(&raw, &BTreeMap::<String, String>::new());

        assert_eq!(resolved.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(resolved.get("BAZ").map(String::as_str), Some("bar_baz"));
    }

    #[test]
    fn forward_references_use_raw_values() {
        let raw = raw(&[("URL", "http://${HOST}:${PORT}"), ("HOST", "localhost"), ("PORT", "80")]);
        let resolved = resolve(&raw, &BTreeMap::<String, String>::new());

        assert_eq!(
            resolved.get("URL").map(String::as_str),
            Some("http://localhost:80")
        );
    }

    #[test]
    fn substitution_is_not_recursive() {
        let raw = raw(&[("A", "${B}"), ("B", "${C}"), ("C", "value"), ("D", "${A}")]);
        let resolved = resolve(&raw, &BTreeMap::<String, String>::new());

        assert_eq!(resolved.get("A").map(String::as_str), Some("${C}"));
        assert_eq!(resolved.get("D").map(String::as_str), Some("${B}"));
    }

    #[test]
    fn falls_back_to_ambient_then_empty() {
        let mut ambient = BTreeMap::new();
        ambient.insert("ALREADY_SET".to_owned(), "YES".to_owned());
        let raw = raw(&[("FROM_ENV", "MAYBE-${ALREADY_SET}"), ("GONE", "<${MISSING}>")]);
        let resolved = resolve(&raw, &ambient);

        assert_eq!(
            resolved.get("FROM_ENV").map(String::as_str),
            Some("MAYBE-YES")
        );
        assert_eq!(resolved.get("GONE").map(String::as_str), Some("<>"));
        assert!(!resolved.contains_key("ALREADY_SET"));
    }

    #[test]
    fn file_values_shadow_ambient() {
        let mut ambient = BTreeMap::new();
        ambient.insert("HOST".to_owned(), "ambient".to_owned());
        let raw = raw(&[("HOST", "file"), ("ADDR", "${HOST}")]);

        let resolved = resolve(&raw, &ambient);
        assert_eq!(resolved.get("ADDR").map(String::as_str), Some("file"));
    }

    #[test]
    fn non_word_placeholders_are_left_verbatim() {
        let raw = raw(&[("A", "x"), ("B", "${A-B} ${} $A ${A.B} ${A}")]);
        let resolved = resolve(&raw, &BTreeMap::<String, String>::new());

        assert_eq!(
            resolved.get("B").map(String::as_str),
            Some("${A-B} ${} $A ${A.B} x")
        );
    }
}
