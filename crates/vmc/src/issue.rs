//! Issue model: what analyzers produce and renderers consume.

use serde::{Deserialize, Serialize};

/// Severity of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
}

/// One frame of a call chain, linking to its caller's frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStack {
    pub file: String,
    pub line: usize,
    pub function: String,
    pub abs_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<Box<CallStack>>,
}

impl CallStack {
    /// Append a chain at the end of this one.
    pub fn append(&mut self, chain: CallStack) {
        match &mut self.call_stack {
            Some(next) => next.append(chain),
            None => self.call_stack = Some(Box::new(chain)),
        }
    }

    /// Iterate frames from this one outward.
    pub fn frames(&self) -> impl Iterator<Item = &CallStack> {
        std::iter::successors(Some(self), |frame| frame.call_stack.as_deref())
    }
}

/// A single finding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "callStack", default)]
    pub call_stack: Option<CallStack>,
}
