//! Report renderers.

mod json;
mod text;

pub use json::JsonRenderer;
pub use text::{format_frame, TextRenderer};

use std::io::Write;

use crate::{Issue, Result};

/// Renders a finished list of issues to a sink.
pub trait Renderer {
    fn render(&self, issues: &[Issue], out: &mut dyn Write) -> Result<()>;

    /// Short format name, e.g. `"json"`.
    fn format(&self) -> &'static str;
}
