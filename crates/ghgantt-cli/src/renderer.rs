//! Markdown output for the terminal.
//!
//! Rich mode styles inline markdown with termimad and colors header lines;
//! plain mode prints the markdown unchanged, which keeps Mermaid blocks
//! copyable and test output stable.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Prints markdown to stdout.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        let mut in_fence = false;
        for line in markdown.lines() {
            if line.starts_with("```") {
                in_fence = !in_fence;
                println!("{line}");
            } else if in_fence {
                // Chart source is printed verbatim
                println!("{line}");
            } else if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
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
    fn test_plain_mode_prints_markdown() {
        let renderer = TerminalRenderer::new(false);
        assert!(!renderer.rich_enabled);
        assert!(renderer.render("**OK** done\n").is_ok());
    }

    #[test]
    fn test_rich_renderer_handles_fenced_blocks() {
        let renderer = TerminalRenderer::new(true);
        assert!(renderer.rich_enabled);
        assert!(renderer
            .render("# Gantt Chart\n\n```mermaid\ngantt\n    A :task1, 2026-01-05, 3d\n```\n")
            .is_ok());
    }

    #[test]
    fn test_default_renders_rich() {
        assert!(TerminalRenderer::default().rich_enabled);
    }
}
