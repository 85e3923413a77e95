use std::path::{Path, PathBuf};

use tracing::debug;

/// File names tried, in order, when no explicit env file is given.
pub const DEFAULT_CANDIDATES: [&str; 4] = [".env", ".env.json", ".env.toml", ".env.yaml"];

/// Find an env file in `start` or up to `search_parent` of its ancestors.
///
/// With `name` set only that file is looked for (an absolute `name` is
/// checked as is); otherwise [`DEFAULT_CANDIDATES`] are tried in order at each
/// level. The nearest directory wins. Returns `None` when nothing matches
/// within the budget, which callers may treat as a normal outcome.
pub fn locate(start: &Path, search_parent: u32, name: Option<&Path>) -> Option<PathBuf> {
    let mut remaining = search_parent;
    let mut dir = Some(start);

    while let Some(current) = dir {
        if let Some(found) = find_in(current, name, remaining) {
            return Some(found);
        }
        if remaining == 0 {
            break;
        }
        remaining -= 1;
        dir = current.parent();
    }

    None
}

fn find_in(dir: &Path, name: Option<&Path>, remaining: u32) -> Option<PathBuf> {
    let mut candidates: Vec<&Path> = Vec::with_capacity(DEFAULT_CANDIDATES.len());
    match name {
        Some(name) => candidates.push(name),
        None => candidates.extend(DEFAULT_CANDIDATES.iter().map(Path::new)),
    }

    for candidate in candidates {
        debug!(
            "searching for {} in {} with search_parent={remaining}",
            candidate.display(),
            dir.display()
        );
        let path = dir.join(candidate);
        if path.is_file() {
            debug!("found env file {}", path.display());
            return Some(path);
        }
    }

    None
}

/// Human-readable name of what [`locate`] looks for, used in error messages.
pub(crate) fn describe(name: Option<&Path>) -> String {
    match name {
        Some(name) => name.display().to_string(),
        None => DEFAULT_CANDIDATES.join(", "),
    }
}
