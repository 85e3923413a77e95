use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::model::RawEntry;
use crate::{parser, structured};

/// Source format of an env file, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Line-oriented `KEY=VALUE` text. Used for every unknown extension.
    #[default]
    DotEnv,
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Pick the decoder for `path`.
    ///
    /// Matching is on the exact lowercase extension, so `.env.json` is JSON
    /// while `.env` and `env.test` are plain dotenv text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("yaml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::DotEnv,
        }
    }

    /// Decode `input` into raw entries in document order.
    ///
    /// Line-level problems in dotenv text are reported through `diagnostics`;
    /// structured formats either decode completely or fail.
    pub fn decode(
        self,
        input: &str,
        source: Option<&Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<RawEntry>, Error> {
        match self {
            Self::DotEnv => Ok(parser::decode(input, diagnostics)),
            Self::Json => structured::decode_json(input, source),
            #[cfg(feature = "yaml")]
            Self::Yaml => structured::decode_yaml(input, source),
            #[cfg(feature = "toml")]
            Self::Toml => structured::decode_toml(input, source),
            #[allow(unreachable_patterns)]
            _ => Err(Error::UnsupportedFormat {
                format: self,
                feature: self.feature(),
            }),
        }
    }

    /// Cargo feature that compiles in the decoder for this format.
    fn feature(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::DotEnv | Self::Json => "default",
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DotEnv => write!(f, "dotenv"),
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
            Self::Toml => write!(f, "TOML"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_decoder_by_extension() {
        assert_eq!(Format::from_path(Path::new(".env")), Format::DotEnv);
        assert_eq!(Format::from_path(Path::new("env.test")), Format::DotEnv);
        assert_eq!(Format::from_path(Path::new("conf/.env.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new(".env.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new(".env.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new(".env.yml")), Format::DotEnv);
        assert_eq!(Format::from_path(Path::new("settings.JSON")), Format::DotEnv);
    }

    #[test]
    fn dotenv_decoding_never_fails() {
        let mut diagnostics = Diagnostics::new();
        let entries = Format::DotEnv
            .decode("not a pair\nA=1\n", None, &mut diagnostics)
            .expect("dotenv decode should succeed");

        assert_eq!(entries, vec![RawEntry::new(2, "A", "1")]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn yaml_dispatch_follows_feature() {
        let result = Format::Yaml.decode("A: 1\n", None, &mut Diagnostics::new());

        if cfg!(feature = "yaml") {
            assert_eq!(result.expect("yaml should decode"), vec![RawEntry::new(1, "A", "1")]);
        } else {
            let err = result.expect_err("yaml should be unsupported");
            assert!(matches!(
                err,
                Error::UnsupportedFormat {
                    format: Format::Yaml,
                    feature: "yaml"
                }
            ));
        }
    }

    #[test]
    fn toml_dispatch_follows_feature() {
        let result = Format::Toml.decode("A = 1\n", None, &mut Diagnostics::new());

        if cfg!(feature = "toml") {
            assert_eq!(result.expect("toml should decode"), vec![RawEntry::new(1, "A", "1")]);
        } else {
            let err = result.expect_err("toml should be unsupported");
            assert!(matches!(
                err,
                Error::UnsupportedFormat {
                    format: Format::Toml,
                    feature: "toml"
                }
            ));
        }
    }

    #[test]
    fn feature_names_match_cargo_features() {
        assert_eq!(Format::Yaml.feature(), "yaml");
        assert_eq!(Format::Toml.feature(), "toml");
    }
}
