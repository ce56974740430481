//! Text model primitives: byte ranges and line/column lookup.

/// A half-open text range `[start, end)` in UTF-8 byte offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid range: {start}..{end}");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns `true` if `other` lies entirely within `self`.
    pub fn contains_range(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two ranges share at least one byte.
    pub fn overlaps(self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A zero-based (line, UTF-8 byte column) pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    line_ends: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        let mut line_ends = Vec::with_capacity(128);
        line_starts.push(0);

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(i);
                    line_starts.push(i + 1);
                    i += 1;
                }
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_ends.push(i);
                        line_starts.push(i + 2);
                        i += 2;
                    } else {
                        line_ends.push(i);
                        line_starts.push(i + 1);
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(text.len());

        Self {
            line_starts,
            line_ends,
            text_len: text.len(),
        }
    }

    #[inline]
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<usize> {
        self.line_starts.get(line as usize).copied()
    }

    #[inline]
    pub fn line_end(&self, line: u32) -> Option<usize> {
        self.line_ends.get(line as usize).copied()
    }

    fn line_of(&self, offset: usize) -> usize {
        // Clamp offsets that point past the end; callers may pass `text_len`
        // when referring to EOF.
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a zero-based line/column pair.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        let line_start = self.line_starts[line];
        let line_end = self.line_ends[line];
        let col = offset.min(line_end) - line_start;
        LineCol {
            line: line as u32,
            col: col as u32,
        }
    }

    /// Convert a zero-based line/column pair back to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<usize> {
        let start = self.line_start(line_col.line)?;
        let end = self.line_end(line_col.line)?;
        let offset = start + line_col.col as usize;
        if offset > end {
            return None;
        }
        Some(offset)
    }
}
