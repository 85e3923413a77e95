use std::path::Path;

use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::env::EnvLookup;
use crate::error::Error;
use crate::filter;
use crate::format::Format;
use crate::model::{ParseMessage, ParseOptions, RawEntry, RawEnvironment, ResolvedEnvironment};
use crate::resolver;

/// Everything a single parse produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnv {
    /// Filtered values before substitution, in document order.
    pub raw: RawEnvironment,
    /// Values after placeholder substitution.
    pub resolved: ResolvedEnvironment,
    /// Lint diagnostics in emission order.
    pub messages: Vec<ParseMessage>,
}

/// Runs one parse: decode, filter by prefix, collect duplicates, resolve.
#[derive(Debug)]
pub struct EnvParser<'a, L: EnvLookup + ?Sized> {
    options: &'a ParseOptions,
    ambient: &'a L,
    diagnostics: Diagnostics,
}

impl<'a, L: EnvLookup + ?Sized> EnvParser<'a, L> {
    pub fn new(options: &'a ParseOptions, ambient: &'a L) -> Self {
        Self {
            options,
            ambient,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Read and parse the file at `path`, picking the format by extension.
    pub fn parse_file(self, path: &Path) -> Result<ParsedEnv, Error> {
        let bytes = std::fs::read(path).map_err(|source| Error::io(path, source))?;
        let content = std::str::from_utf8(&bytes).map_err(|source| Error::InvalidEncoding {
            path: path.to_path_buf(),
            source,
        })?;
        let format = Format::from_path(path);
        debug!("parsing {} as {format}", path.display());
        self.parse_source(content, format, Some(path))
    }

    /// Parse in-memory `input` in the given format.
    pub fn parse_str(self, input: &str, format: Format) -> Result<ParsedEnv, Error> {
        self.parse_source(input, format, None)
    }

    fn parse_source(
        mut self,
        input: &str,
        format: Format,
        source: Option<&Path>,
    ) -> Result<ParsedEnv, Error> {
        let entries = format.decode(input, source, &mut self.diagnostics)?;
        let raw = self.collect(entries);
        let resolved = resolver::resolve(&raw, self.ambient);

        Ok(ParsedEnv {
            raw,
            resolved,
            messages: self.diagnostics.into_messages(),
        })
    }

    fn collect(&mut self, entries: Vec<RawEntry>) -> RawEnvironment {
        let mut raw = RawEnvironment::new();
        for entry in entries {
            let Some(entry) = filter::apply(entry, self.options, &mut self.diagnostics) else {
                continue;
            };
            let line = entry.line;
            let key = entry.key.clone();
            if raw.insert(entry.key, entry.value) {
                self.diagnostics
                    .error(line, format!("duplicated '{key}' variable"));
            }
        }
        raw
    }
}

/// Parse the env file at `path` into its resolved variables.
///
/// Fails on I/O errors and on broken structured documents; line-level
/// problems only show up in [`lint_env_file`].
pub fn parse_env_file<L>(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    ambient: &L,
) -> Result<ResolvedEnvironment, Error>
where
    L: EnvLookup + ?Sized,
{
    EnvParser::new(options, ambient)
        .parse_file(path.as_ref())
        .map(|parsed| parsed.resolved)
}

/// Collect the lint diagnostics for the env file at `path`.
pub fn lint_env_file<L>(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    ambient: &L,
) -> Result<Vec<ParseMessage>, Error>
where
    L: EnvLookup + ?Sized,
{
    EnvParser::new(options, ambient)
        .parse_file(path.as_ref())
        .map(|parsed| parsed.messages)
}

/// Parse env definitions held in memory.
pub fn parse_env_str<L>(
    input: &str,
    format: Format,
    options: &ParseOptions,
    ambient: &L,
) -> Result<ParsedEnv, Error>
where
    L: EnvLookup + ?Sized,
{
    EnvParser::new(options, ambient).parse_str(input, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Level;
    use std::collections::BTreeMap;

    fn parse(input: &str, options: &ParseOptions) -> ParsedEnv {
        parse_env_str(input, Format::DotEnv, options, &BTreeMap::<String, String>::new())
            .expect("parse should succeed")
    }

    #[test]
    fn end_to_end_substitution() {
        let parsed = parse("FOO=bar\nBAZ=${FOO}_baz\n", &ParseOptions::new());

        let expected: ResolvedEnvironment = [("FOO", "bar"), ("BAZ", "bar_baz")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        assert_eq!(parsed.resolved, expected);
        assert!(parsed.messages.is_empty());
    }

    #[test]
    fn duplicate_key_keeps_last_value_and_reports_error() {
        let parsed = parse("A=1\nB=x\nA=2\n", &ParseOptions::new());

        assert_eq!(parsed.resolved.get("A").map(String::as_str), Some("2"));
        assert_eq!(parsed.raw.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(
            parsed.messages,
            vec![ParseMessage {
                line_number: 3,
                level: Level::Error,
                message: "duplicated 'A' variable".to_owned(),
            }]
        );
    }

    #[test]
    fn duplicates_are_detected_after_renaming() {
        let options = ParseOptions::new().prefix("APP_");
        let parsed = parse("APP_A=1\nAPP_A=2\n", &options);

        assert_eq!(parsed.resolved.get("A").map(String::as_str), Some("2"));
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages[0].message, "duplicated 'A' variable");
    }

    #[test]
    fn references_use_renamed_keys() {
        let options = ParseOptions::new().prefix("APP_");
        let parsed = parse("APP_HOST=db\nAPP_URL=pg://${HOST}\n", &options);

        assert_eq!(
            parsed.resolved.get("URL").map(String::as_str),
            Some("pg://db")
        );
    }

    #[test]
    fn diagnostics_follow_emission_order() {
        let options = ParseOptions::new().prefix("APP_");
        let parsed = parse("OTHER=1\nnot a pair\nAPP_A=1\nAPP_A=2\n", &options);

        let levels: Vec<_> = parsed
            .messages
            .iter()
            .map(|message| (message.line_number, message.level))
            .collect();
        assert_eq!(
            levels,
            vec![(2, Level::Warning), (1, Level::Info), (4, Level::Error)]
        );
    }

    #[test]
    fn structured_input_goes_through_filter_and_resolver() {
        let options = ParseOptions::new().prefix("APP_");
        let parsed = parse_env_str(
            r#"{"APP_NAME": "demo", "APP_GREETING": "hi ${NAME}", "OTHER": 1}"#,
            Format::Json,
            &options,
            &BTreeMap::<String, String>::new(),
        )
        .expect("parse should succeed");

        assert_eq!(
            parsed.resolved.get("GREETING").map(String::as_str),
            Some("hi demo")
        );
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages[0].line_number, 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = parse_env_file(
            "/definitely/not/here/.env",
            &ParseOptions::new(),
            &BTreeMap::<String, String>::new(),
        )
        .expect_err("expected I/O error");
        assert!(matches!(err, Error::Io { .. }));
    }
}
