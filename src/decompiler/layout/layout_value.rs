//! The line buffer every rendered (sub)expression is built in.
//!
//! A `LayoutValue` is deliberately not `Clone`: wrapping splices its lines
//! into the parent, so each value is moved into exactly one parent.

#[derive(Debug, PartialEq, Eq)]
pub struct LayoutValue {
    lines: Vec<String>,

    /// The text is an operator expression that must be parenthesized
    /// before it is embedded as an operand
    pub needs_bracketing: bool,
}

impl LayoutValue {
    pub fn single(line: impl Into<String>) -> Self {
        LayoutValue {
            lines: vec![line.into()],
            needs_bracketing: false,
        }
    }

    /// Never empty: an empty line list becomes one blank line.
    pub fn from_lines(mut lines: Vec<String>, needs_bracketing: bool) -> Self {
        if lines.is_empty() {
            lines.push(String::new());
        }
        LayoutValue {
            lines,
            needs_bracketing,
        }
    }

    /// Longest line, in characters.
    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_multiline(&self) -> bool {
        self.lines.len() > 1
    }

    /// A single line with nothing on it.
    pub fn is_blank(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn first_line(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    pub fn last_line(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }

    pub fn append_to_last_line(&mut self, text: &str) {
        match self.lines.last_mut() {
            Some(line) => line.push_str(text),
            None => self.lines.push(text.to_owned()),
        }
    }

    pub fn prepend_to_first_line(&mut self, text: &str) {
        match self.lines.first_mut() {
            Some(line) => line.insert_str(0, text),
            None => self.lines.push(text.to_owned()),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn insert_first_line(&mut self, line: impl Into<String>) {
        self.lines.insert(0, line.into());
    }

    /// Moves all of `other`'s lines onto the end of this value.
    pub fn append_lines(&mut self, other: LayoutValue) {
        self.lines.extend(other.lines);
    }

    pub(crate) fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}
