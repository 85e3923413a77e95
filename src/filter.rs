use crate::diagnostics::Diagnostics;
use crate::model::{ParseOptions, RawEntry};

/// Apply the prefix rule to a single key.
///
/// Returns `None` when the key does not carry the prefix, otherwise the key
/// to store, which has the prefix removed when `strip_prefix` is set. A key
/// that is exactly the prefix is kept whole.
pub fn filter_key<'a>(key: &'a str, options: &ParseOptions) -> Option<&'a str> {
    let Some(prefix) = options.active_prefix() else {
        return Some(key);
    };

    if key == prefix {
        return Some(key);
    }

    let stripped = key.strip_prefix(prefix)?;
    if options.strip_prefix {
        Some(stripped)
    } else {
        Some(key)
    }
}

/// Filter and rename one decoded entry, recording dropped keys as `info`.
pub(crate) fn apply(
    mut entry: RawEntry,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Option<RawEntry> {
    match filter_key(&entry.key, options).map(str::to_owned) {
        Some(key) => {
            entry.key = key;
            Some(entry)
        }
        None => {
            let prefix = options.active_prefix().unwrap_or_default();
            diagnostics.info(
                entry.line,
                format!("skip {} without prefix {prefix}", entry.key),
            );
            None
        }
    }
}
