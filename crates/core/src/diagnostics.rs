//! User-facing diagnostics for unparsable input.
//!
//! The engine only ever writes to a [`LogSink`]; what a sink does with a
//! message never affects parsing.

use crate::source::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A diagnostic message with `{}` holes filled positionally by its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTemplate {
    /// Input skipped while trying to match the named production
    Unparsable,
    /// Input left over after the start production matched
    UnconsumedInput,
    /// A token that cannot be read as the name or value its leaf calls for
    Undecodable,
    /// A grammar-specific message
    Custom { key: String, format: String },
}

impl MessageTemplate {
    pub fn custom(key: impl Into<String>, format: impl Into<String>) -> Self {
        MessageTemplate::Custom {
            key: key.into(),
            format: format.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            MessageTemplate::Unparsable => "Unparsable",
            MessageTemplate::UnconsumedInput => "UnconsumedInput",
            MessageTemplate::Undecodable => "Undecodable",
            MessageTemplate::Custom { key, .. } => key,
        }
    }

    pub fn format_string(&self) -> &str {
        match self {
            MessageTemplate::Unparsable => "Expected {} here",
            MessageTemplate::UnconsumedInput => "Unexpected input after {}",
            MessageTemplate::Undecodable => "Cannot decode {}",
            MessageTemplate::Custom { format, .. } => format,
        }
    }

    /// Fills each `{}` with the next value. Extra holes stay as `{}`.
    pub fn format(&self, values: &[String]) -> String {
        let mut out = String::new();
        let mut values = values.iter();
        let mut rest = self.format_string();
        while let Some(i) = rest.find("{}") {
            out.push_str(&rest[..i]);
            match values.next() {
                Some(v) => out.push_str(v),
                None => out.push_str("{}"),
            }
            rest = &rest[i + 2..];
        }
        out.push_str(rest);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub template: MessageTemplate,
    pub pos: Position,
    pub values: Vec<String>,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.template.format(&self.values)
    }

    /// Flat JSON rendering used by tooling and test output.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":     self.pos.loc.as_str(),
            "left":     self.pos.left,
            "message":  self.message(),
            "right":    self.pos.right,
            "severity": self.severity,
            "template": self.template.key(),
        })
    }
}

/// Receives diagnostics from combinators and the lifter.
pub trait LogSink {
    fn log(
        &mut self,
        severity: Severity,
        template: &MessageTemplate,
        pos: &Position,
        values: &[String],
    );
}

/// Collects diagnostics in order of arrival.
#[derive(Debug, Default)]
pub struct ListBackedLogSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl ListBackedLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(Diagnostic::message).collect()
    }
}

impl LogSink for ListBackedLogSink {
    fn log(
        &mut self,
        severity: Severity,
        template: &MessageTemplate,
        pos: &Position,
        values: &[String],
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            template: template.clone(),
            pos: pos.clone(),
            values: values.to_vec(),
        });
    }
}

/// Forwards diagnostics to `tracing` events under the `astbuild` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(
        &mut self,
        severity: Severity,
        template: &MessageTemplate,
        pos: &Position,
        values: &[String],
    ) {
        let message = template.format(values);
        match severity {
            Severity::Error => {
                tracing::error!(target: "astbuild", %pos, template = template.key(), "{}", message)
            }
            Severity::Warning => {
                tracing::warn!(target: "astbuild", %pos, template = template.key(), "{}", message)
            }
            Severity::Info => {
                tracing::info!(target: "astbuild", %pos, template = template.key(), "{}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CodeLocation;

    #[test]
    fn format_fills_holes_in_order() {
        let t = MessageTemplate::custom("Pair", "{} then {}");
        assert_eq!(t.format(&["a".into(), "b".into()]), "a then b");
        assert_eq!(t.format(&["a".into()]), "a then {}");
    }

    #[test]
    fn list_sink_keeps_order_and_severity() {
        let pos = Position::new(CodeLocation::new("f"), 2, 4);
        let mut sink = ListBackedLogSink::new();
        sink.log(Severity::Warning, &MessageTemplate::Unparsable, &pos, &["Expr".into()]);
        assert!(!sink.has_errors());
        sink.log(Severity::Error, &MessageTemplate::UnconsumedInput, &pos, &["Root".into()]);
        assert!(sink.has_errors());
        assert_eq!(
            sink.messages(),
            vec!["Expected Expr here", "Unexpected input after Root"]
        );
    }

    #[test]
    fn json_rendering_is_flat() {
        let d = Diagnostic {
            severity: Severity::Error,
            template: MessageTemplate::Unparsable,
            pos: Position::new(CodeLocation::new("f.src"), 1, 3),
            values: vec!["Args".into()],
        };
        let v = d.to_json_value();
        assert_eq!(v["file"], "f.src");
        assert_eq!(v["message"], "Expected Args here");
        assert_eq!(v["severity"], "Error");
        assert_eq!(v["template"], "Unparsable");
    }
}
