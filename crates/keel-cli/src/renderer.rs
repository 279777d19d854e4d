//! Terminal output with optional markdown styling.
//!
//! Display impls in keel-core produce markdown. In rich mode headers are
//! colored and inline markup (`**bold**`, `` `code` ``) is styled by
//! termimad; in plain mode the text is written unchanged.

use std::io::{self, Write};

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

const HEADER_STYLE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// Writes markdown to stdout, styled or plain.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_fg(Color::Cyan);
        skin.inline_code.set_bg(Color::AnsiValue(236));

        Self { rich_enabled, skin }
    }

    /// Formats `markdown` for the terminal.
    ///
    /// Header lines keep their `#` markers so nesting stays visible.
    pub fn format(&self, markdown: &str) -> String {
        if !self.rich_enabled {
            return markdown.to_string();
        }

        let mut out = String::with_capacity(markdown.len());
        for line in markdown.lines() {
            if line.starts_with('#') {
                out.push_str(HEADER_STYLE);
                out.push_str(line);
                out.push_str(RESET);
            } else {
                out.push_str(&self.skin.inline(line).to_string());
            }
            out.push('\n');
        }
        out
    }

    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.format(markdown).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer_passes_text_through() {
        let renderer = TerminalRenderer::new(false);
        let markdown = "# Plan: site.yml\n\n- When: `os == \"linux\"`\n";

        assert_eq!(renderer.format(markdown), markdown);
    }

    #[test]
    fn test_rich_renderer_styles_headers() {
        let renderer = TerminalRenderer::new(true);
        let text = renderer.format("## [1] install git (step-0001)\n- Action: shell\n");

        assert!(text.starts_with("\x1b[1;34m## [1] install git (step-0001)\x1b[0m\n"));
        assert!(text.contains("Action: shell"));
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }
}
