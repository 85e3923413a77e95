use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::Format;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not valid UTF-8", .path.display())]
    InvalidEncoding {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The file needs a decoder that was compiled out of this build.
    #[error("{format} env files are not supported; enable the `{feature}` feature of runenv")]
    UnsupportedFormat {
        format: Format,
        feature: &'static str,
    },

    /// A structured document could not be parsed, or its root is not a flat
    /// mapping of keys to scalar values.
    #[error("invalid {format} document{}: {message}", describe_path(.path))]
    Decode {
        path: Option<PathBuf>,
        format: Format,
        message: String,
    },

    #[error(
        "no env file {name} found in `{}` (searched {search_parent} parent directories)",
        .start.display()
    )]
    NotFound {
        name: String,
        start: PathBuf,
        search_parent: u32,
    },
}

impl Error {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode(format: Format, path: Option<&Path>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.map(Path::to_path_buf),
            format,
            message: message.into(),
        }
    }
}

fn describe_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" `{}`", path.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_mentions_path_when_known() {
        let err = Error::decode(Format::Json, Some(Path::new("/tmp/.env.json")), "boom");
        assert_eq!(
            err.to_string(),
            "invalid JSON document `/tmp/.env.json`: boom"
        );

        let err = Error::decode(Format::Toml, None, "boom");
        assert_eq!(err.to_string(), "invalid TOML document: boom");
    }

    #[test]
    fn unsupported_format_names_the_feature() {
        let err = Error::UnsupportedFormat {
            format: Format::Yaml,
            feature: "yaml",
        };
        assert!(err.to_string().contains("enable the `yaml` feature"));
    }
}
