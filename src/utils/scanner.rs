/// Forward-only cursor over a string, positioned in Unicode scalar units so
/// multi-byte runs never split. Callers that need lookahead save and restore
/// the position explicitly; no other backtracking state is kept.
#[derive(Debug)]
pub struct TextScanner {
    chars: Vec<char>,
    pos: usize,
}

impl TextScanner {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.chars.len());
    }

    pub fn peek_one(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek(&self, n: usize) -> Option<String> {
        if self.pos + n > self.chars.len() {
            return None;
        }
        Some(self.chars[self.pos..self.pos + n].iter().collect())
    }

    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    /// Consumes exactly `n` characters, or nothing when fewer remain.
    pub fn scan_chars(&mut self, n: usize) -> Option<String> {
        let scanned = self.peek(n)?;
        self.pos += n;
        Some(scanned)
    }

    /// Consumes characters until one of `stop` (or end of input). Returns
    /// `None` when the cursor is already at a stop character or at the end.
    pub fn scan_up_to(&mut self, stop: &[char]) -> Option<String> {
        let start = self.pos;
        while let Some(ch) = self.peek_one() {
            if stop.contains(&ch) {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return None;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// Consumes one line, excluding the terminator. Returns `Some("")` for a
    /// blank line and `None` only at end of input.
    pub fn scan_line(&mut self) -> Option<String> {
        if self.at_end() {
            return None;
        }

        let line = self.scan_up_to(&['\n']).unwrap_or_default();
        self.skip(1);
        Some(line.trim_end_matches('\r').to_owned())
    }

    /// Scans a run of decimal (or hexadecimal) digits into an integer.
    /// Leaves the cursor untouched and returns `None` when the next
    /// character is not a digit.
    pub fn scan_int(&mut self, hex: bool) -> Option<u64> {
        let radix = if hex { 16 } else { 10 };
        let mut value: u64 = 0;
        let mut any = false;

        while let Some(ch) = self.peek_one() {
            match ch.to_digit(radix) {
                Some(digit) => {
                    value = value.checked_mul(radix as u64)?.checked_add(digit as u64)?;
                    any = true;
                    self.pos += 1;
                }
                None => break,
            }
        }

        if any {
            Some(value)
        } else {
            None
        }
    }
}
