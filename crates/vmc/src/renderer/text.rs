//! Text renderer: a human-readable report grouped by message.

use std::collections::BTreeMap;
use std::io::Write;

use crate::profile::VmProfile;
use crate::renderer::Renderer;
use crate::{CallStack, Issue, Result, Severity};

const RULE: &str = "------------------------------";
const DOUBLE_RULE: &str = "==============================";

/// Groups issues by message, prints a summary and the concatenated call
/// stacks of each group. File locations become OSC-8 hyperlinks when the
/// sink is a terminal.
pub struct TextRenderer<'p> {
    profile: &'p VmProfile,
    hyperlinks: bool,
}

impl<'p> TextRenderer<'p> {
    pub fn new(profile: &'p VmProfile) -> Self {
        Self {
            profile,
            hyperlinks: false,
        }
    }

    /// Emit clickable file links; only sensible when writing to a TTY.
    pub fn with_hyperlinks(mut self, hyperlinks: bool) -> Self {
        self.hyperlinks = hyperlinks;
        self
    }
}

impl Renderer for TextRenderer<'_> {
    fn render(&self, issues: &[Issue], out: &mut dyn Write) -> Result<()> {
        if issues.is_empty() {
            return Ok(());
        }

        // BTreeMap keeps group order stable across runs.
        let mut groups: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
        for issue in issues {
            groups.entry(&issue.message).or_default().push(issue);
        }

        let critical = groups
            .values()
            .filter(|group| group_severity(group) == Severity::Critical)
            .count();
        let total = groups.len();

        let mut report = String::new();
        report.push_str(DOUBLE_RULE);
        report.push_str("\nCompatibility Analysis Report\n");
        report.push_str(DOUBLE_RULE);
        report.push_str("\n\n");
        report.push_str(&format!("VM:     {}\n", self.profile.vm_name));
        report.push_str(&format!("OS:     {}\n", self.profile.goos));
        report.push_str(&format!("Arch:   {}\n\n", self.profile.goarch));
        report.push_str(RULE);
        report.push_str("\nSummary\n");
        report.push_str(RULE);
        report.push('\n');
        report.push_str(&format!("Critical issues: {critical}\n"));
        report.push_str(&format!("Warnings:        {}\n", total - critical));
        report.push_str(&format!("Total:           {total}\n\n"));
        report.push_str(RULE);
        report.push_str("\nDetailed Issues\n");
        report.push_str(RULE);
        report.push_str("\n\n");

        for (counter, (message, group)) in groups.iter().enumerate() {
            let severity = match group_severity(group) {
                Severity::Critical => "CRITICAL",
                Severity::Warning => "WARNING",
            };
            report.push_str(&format!("{}. [{severity}] {message}\n", counter + 1));
            if let Some(impact) = &group[0].impact {
                report.push_str(&format!("   - Impact: {impact}\n"));
            }
            if let Some(reference) = &group[0].reference {
                report.push_str(&format!("   - Reference: {reference}\n"));
            }
            report.push_str("   - Call stack:");
            for issue in group {
                if let Some(chain) = &issue.call_stack {
                    report.push_str(&self.render_call_stack(chain));
                }
                report.push('\n');
            }
            report.push('\n');
        }

        report.push_str(RULE);
        report.push_str("\nRecommendations\n");
        report.push_str(RULE);
        report.push('\n');
        report.push_str("- Verify flagged functions against the target VM before deploying.\n");
        report.push_str("End of Report\n");

        out.write_all(report.as_bytes())?;
        Ok(())
    }

    fn format(&self) -> &'static str {
        "text"
    }
}

impl TextRenderer<'_> {
    fn render_call_stack(&self, chain: &CallStack) -> String {
        let mut rendered = String::new();
        for frame in chain.frames() {
            rendered.push_str("\n       -> ");
            rendered.push_str(&format_frame(frame, self.hyperlinks));
        }
        rendered
    }
}

/// One frame as `file:line (absolute) : (function)`, optionally wrapped
/// in an OSC-8 hyperlink.
pub fn format_frame(frame: &CallStack, hyperlink: bool) -> String {
    let location = if hyperlink {
        format!(
            "\x1b[94m\x1b]8;;file://{abs}:{line}\x1b\\{file}:{line}\x1b]8;;\x1b\\\x1b[0m",
            abs = frame.abs_path,
            line = frame.line,
            file = frame.file,
        )
    } else {
        format!(
            "{}:{} ({})",
            frame.file, frame.line, frame.abs_path
        )
    };
    format!("{location} : ({})", frame.function)
}

fn group_severity(group: &[&Issue]) -> Severity {
    group
        .iter()
        .map(|issue| issue.severity)
        .max()
        .unwrap_or(Severity::Warning)
}
