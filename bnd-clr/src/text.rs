//! Small indented text buffer used to accumulate generated fragments.

use std::fmt;

const INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct TextGenerator {
    text: String,
    indent: usize,
    at_line_start: bool,
}

impl TextGenerator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent {
                self.text.push_str(INDENT);
            }
        }
        self.text.push_str(s);
        self.at_line_start = false;
    }

    pub fn write_line(&mut self, s: &str) {
        self.write(s);
        self.new_line();
    }

    pub fn new_line(&mut self) {
        self.text.push('\n');
        self.at_line_start = true;
    }

    pub fn push_indent(&mut self) {
        self.indent += 1;
    }

    pub fn pop_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Non-empty lines, trimmed of trailing whitespace.
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.trim().is_empty())
            .collect()
    }
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
