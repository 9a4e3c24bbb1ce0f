//! Support for reading eo sources character by character.
//!
//! The evaluator never tokenizes ahead of time: every construct reader pulls
//! characters from a [`Cursor`] as it needs them, and the dispatcher decides
//! what to do from a single character. The only backward movement is
//! [`Cursor::unread`], which steps back over the last character read.

pub mod literal;

/// A 1-indexed position in a source, for error messages.
///
/// Positions are relative to the buffer being evaluated when the error was
/// raised. That is the function body, operand, argument or included file
/// the error is in, not the top-level source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// A read position over a source buffer of known length.
///
/// The cursor is advanced destructively by every reader that consumes from
/// it; callers can't assume the position is unchanged after reading a value.
#[derive(Debug)]
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor {
            source,
            position: 0,
        }
    }

    /// Current byte offset into the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Read one character, or None at end of buffer.
    pub fn read(&mut self) -> Option<char> {
        let ch = self.source[self.position..].chars().next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Step back over the last character read.
    pub fn unread(&mut self) {
        if let Some(ch) = self.source[..self.position].chars().next_back() {
            self.position -= ch.len_utf8();
        }
    }

    /// The unread remainder of the buffer.
    pub fn remainder(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Skip forward over `bytes` bytes of the remainder.
    ///
    /// `bytes` must land on a character boundary; readers only pass lengths
    /// of matches taken from [`Cursor::remainder`].
    pub fn advance(&mut self, bytes: usize) {
        self.position = (self.position + bytes).min(self.source.len());
    }

    /// The text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Read characters up to (and consuming) `terminator`.
    ///
    /// Returns the text before the terminator, and whether the terminator was
    /// found before the end of the buffer.
    pub fn read_until(&mut self, terminator: char) -> (&'a str, bool) {
        let start = self.position;
        while let Some(ch) = self.read() {
            if ch == terminator {
                let end = self.position - ch.len_utf8();
                return (&self.source[start..end], true);
            }
        }
        (&self.source[start..], false)
    }

    /// Line and column of a byte offset in this buffer.
    pub fn location_of(&self, offset: usize) -> Location {
        let (lines, columns) = cursor_distance(&self.source[..offset.min(self.source.len())]);
        Location {
            line: lines + 1,
            column: columns + 1,
        }
    }
}

/// Returns the (line, column) that the cursor ends at, after following the given path,
/// assuming it started at (0, 0).
/// Columns count characters; a tab is a single column.
fn cursor_distance(s: &str) -> (usize, usize) {
    let line_count = s.matches('\n').count();
    let last_line_start = s.rfind('\n').map(|x| x + 1).unwrap_or(0);
    (line_count, s[last_line_start..].chars().count())
}
