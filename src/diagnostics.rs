use tracing::debug;

use crate::model::{Level, ParseMessage};

/// Append-only collector for lint messages emitted while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<ParseMessage>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line_number: u32, level: Level, message: impl Into<String>) {
        let message = message.into();
        debug!(line_number, %level, "{message}");
        self.messages.push(ParseMessage {
            line_number,
            level,
            message,
        });
    }

    pub fn info(&mut self, line_number: u32, message: impl Into<String>) {
        self.push(line_number, Level::Info, message);
    }

    pub fn warning(&mut self, line_number: u32, message: impl Into<String>) {
        self.push(line_number, Level::Warning, message);
    }

    pub fn error(&mut self, line_number: u32, message: impl Into<String>) {
        self.push(line_number, Level::Error, message);
    }

    pub fn messages(&self) -> &[ParseMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ParseMessage> {
        self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_emission_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning(4, "line not matched");
        diagnostics.info(1, "skip OTHER without prefix APP_");
        diagnostics.error(7, "duplicated 'A' variable");

        let lines: Vec<_> = diagnostics
            .messages()
            .iter()
            .map(|message| message.line_number)
            .collect();
        assert_eq!(lines, vec![4, 1, 7]);
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn helpers_set_the_level() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(1, "skip");
        diagnostics.error(2, "duplicated 'A' variable");

        let levels: Vec<_> = diagnostics
            .into_messages()
            .into_iter()
            .map(|message| message.level)
            .collect();
        assert_eq!(levels, vec![Level::Info, Level::Error]);
    }
}
