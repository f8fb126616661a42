//! Line and field splitting for header text.
//!
//! The lexer knows nothing about what a line means: it only turns text into
//! lines (LF or CRLF terminated) and lines into trimmed, comma-separated fields.

/// Splits header text into lines of trimmed fields
#[derive(Debug, Clone)]
pub struct LineLexer<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LineLexer<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        LineLexer { lines }
    }

    /// Number of physical lines, including a trailing empty one
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// Raw line at a 0-based position
    pub fn line(&self, index: usize) -> Option<&'a str> {
        self.lines.get(index).copied()
    }

    /// Trimmed fields of the line at a 0-based position
    pub fn fields(&self, index: usize) -> Option<Vec<&'a str>> {
        self.line(index).map(split_fields)
    }
}

/// 按逗号分割并去除每个字段两端的空白
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}
