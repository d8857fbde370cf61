//! JSON renderer: an array of issue objects.

use std::io::Write;

use crate::renderer::Renderer;
use crate::{Error, Issue, Result};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, issues: &[Issue], out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer(&mut *out, issues).map_err(|err| Error::Io(err.into()))?;
        writeln!(out)?;
        Ok(())
    }

    fn format(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallStack, Severity};

    #[test]
    fn test_renders_issue_array() {
        let issues = vec![Issue {
            severity: Severity::Critical,
            message: "Potential Incompatible Syscall Detected: 5000".to_string(),
            impact: None,
            reference: None,
            call_stack: Some(CallStack {
                file: "prog.dump".to_string(),
                line: 12,
                function: "runtime.read".to_string(),
                abs_path: "/tmp/prog.dump".to_string(),
                call_stack: None,
            }),
        }];

        let mut out = Vec::new();
        JsonRenderer.render(&issues, &mut out).unwrap();
        let parsed: Vec<Issue> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].message, issues[0].message);
    }

    #[test]
    fn test_empty_report_is_empty_array() {
        let mut out = Vec::new();
        JsonRenderer.render(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }
}
