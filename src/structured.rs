//! Decoders for env files written as a flat JSON, YAML or TOML mapping.
//!
//! These formats have no per-line fidelity: entries get synthetic line
//! numbers starting at 1, in the order the document declares its keys.
//! Scalars are rendered as strings; nested values are rejected.

use std::path::Path;

use crate::error::Error;
use crate::format::Format;
use crate::model::RawEntry;

const NOT_A_MAPPING: &str = "the document root must be a mapping of keys to scalar values";

pub(crate) fn decode_json(input: &str, source: Option<&Path>) -> Result<Vec<RawEntry>, Error> {
    use serde_json::Value;

    let document: Value = serde_json::from_str(input)
        .map_err(|err| Error::decode(Format::Json, source, err.to_string()))?;
    let Value::Object(map) = document else {
        return Err(Error::decode(Format::Json, source, NOT_A_MAPPING));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let value = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                return Err(nested_value(Format::Json, source, &key));
            }
        };
        push_entry(&mut entries, Format::Json, source, key, value)?;
    }

    Ok(entries)
}

#[cfg(feature = "yaml")]
pub(crate) fn decode_yaml(input: &str, source: Option<&Path>) -> Result<Vec<RawEntry>, Error> {
    use serde_yaml::Value;

    let document: Value = serde_yaml::from_str(input)
        .map_err(|err| Error::decode(Format::Yaml, source, err.to_string()))?;
    let Value::Mapping(map) = document else {
        return Err(Error::decode(Format::Yaml, source, NOT_A_MAPPING));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key = match key {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => {
                return Err(Error::decode(
                    Format::Yaml,
                    source,
                    "mapping keys must be scalars",
                ));
            }
        };
        let value = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null => String::new(),
            Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
                return Err(nested_value(Format::Yaml, source, &key));
            }
        };
        push_entry(&mut entries, Format::Yaml, source, key, value)?;
    }

    Ok(entries)
}

#[cfg(feature = "toml")]
pub(crate) fn decode_toml(input: &str, source: Option<&Path>) -> Result<Vec<RawEntry>, Error> {
    use toml::Value;

    let table: toml::Table = toml::from_str(input)
        .map_err(|err| Error::decode(Format::Toml, source, err.message().to_owned()))?;

    let mut entries = Vec::with_capacity(table.len());
    for (key, value) in table {
        let value = match value {
            Value::String(text) => text,
            Value::Integer(number) => number.to_string(),
            Value::Float(number) => format_float(number),
            Value::Boolean(flag) => flag.to_string(),
            Value::Datetime(datetime) => datetime.to_string(),
            Value::Array(_) | Value::Table(_) => {
                return Err(nested_value(Format::Toml, source, &key));
            }
        };
        push_entry(&mut entries, Format::Toml, source, key, value)?;
    }

    Ok(entries)
}

#[cfg(feature = "toml")]
fn format_float(number: f64) -> String {
    // `Debug` is the shortest round-trip form and keeps `.0` on whole numbers.
    if number.is_nan() {
        "nan".to_owned()
    } else {
        format!("{number:?}")
    }
}

/// Keys must be usable as environment variable names: non-empty, with no
/// `=` and no NUL. Values must not contain NUL.
fn push_entry(
    entries: &mut Vec<RawEntry>,
    format: Format,
    source: Option<&Path>,
    key: String,
    value: String,
) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::decode(format, source, "empty keys are not allowed"));
    }
    if key.contains(['=', '\0']) {
        return Err(Error::decode(
            format,
            source,
            format!("key {key:?} contains `=` or a NUL character"),
        ));
    }
    if value.contains('\0') {
        return Err(Error::decode(
            format,
            source,
            format!("value of `{key}` contains a NUL character"),
        ));
    }

    let line = entries.len() as u32 + 1;
    entries.push(RawEntry::new(line, key, value));
    Ok(())
}

fn nested_value(format: Format, source: Option<&Path>, key: &str) -> Error {
    Error::decode(
        format,
        source,
        format!("value of `{key}` is not a scalar; nested values are not supported"),
    )
}
