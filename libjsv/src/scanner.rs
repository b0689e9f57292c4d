//! Character-level cursor over template and record text.
//!
//! Columns in error messages are 0-based indices of the last character the
//! scanner consumed, so a scanner that has just returned the character at
//! index `i` reports column `i`.

/// Forward cursor over the characters of an input string.
///
/// The input is widened to a `Vec<char>` up front; columns count characters,
/// not bytes, so multi-byte input reports the positions a reader sees.
pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub(crate) fn new(input: &str) -> Self {
        Scanner {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Consume and return the next character, or `None` at end of input.
    pub(crate) fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Look at the next character without consuming it.
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Push the last consumed character back onto the input.
    pub(crate) fn retreat(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Consume `n` characters without inspecting them.
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// The unconsumed tail of the input.
    pub(crate) fn remainder(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// 0-based index of the last consumed character.
    pub(crate) fn column(&self) -> usize {
        self.pos.saturating_sub(1)
    }

    /// 0-based index of the next character to be consumed.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}
