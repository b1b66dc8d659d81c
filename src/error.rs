//! Error types for reading and writing graph documents

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read graph: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid graph JSON at line {line}, column {column}: {message}")]
    Json {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Failed to serialize graph: {0}")]
    Serialize(serde_json::Error),
}

impl GraphError {
    /// Wrap a deserialization error, keeping its source location
    pub fn json(err: serde_json::Error) -> Self {
        let message = err.to_string();
        // serde_json appends " at line L column C" to every located message
        let message = match message.rfind(" at line ") {
            Some(pos) if err.line() > 0 => message[..pos].to_string(),
            _ => message,
        };
        GraphError::Json {
            line: err.line(),
            column: err.column(),
            message,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let GraphError::Json {
            line,
            column,
            message,
        } = self
        else {
            return self.to_string();
        };

        let offset = byte_offset(source, *line, *column);
        let end = (offset + 1).min(source.len());
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, offset)
            .with_message("invalid graph document")
            .with_label(
                Label::new((filename, offset..end))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match (written, String::from_utf8(buf)) {
            (Ok(()), Ok(report)) => report,
            _ => self.to_string(),
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the source
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(source: &str) -> GraphError {
        let err = serde_json::from_str::<serde_json::Value>(source).unwrap_err();
        GraphError::json(err)
    }

    #[test]
    fn test_json_error_location() {
        let err = parse_error("{\n  \"nodes\": [,]\n}");
        match err {
            GraphError::Json { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column > 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_message_has_no_duplicate_location() {
        let err = parse_error("{ \"nodes\": [ }");
        let text = err.to_string();
        assert_eq!(text.matches("line").count(), 1);
    }

    #[test]
    fn test_format_names_file() {
        let source = "{\n  \"nodes\": [,]\n}";
        let report = parse_error(source).format(source, "graph.json");
        assert!(report.contains("graph.json"));
        assert!(report.contains("invalid graph document"));
    }

    #[test]
    fn test_format_non_json_error() {
        let err = GraphError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.format("", "graph.json"), "Failed to read graph: gone");
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(byte_offset("ab\ncd", 2, 2), 4);
        assert_eq!(byte_offset("ab", 5, 9), 2);
    }
}
