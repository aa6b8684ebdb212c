// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A byte range in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice the source text covered by this span.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Precomputed line starts for byte-offset → line:col lookup.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset where each line begins; the first entry is always 0.
    starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        LineMap { starts }
    }

    /// Convert a byte offset to (line, col), both 1-based.
    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (idx + 1, offset - self.starts[idx] + 1)
    }

    /// Text of a 1-based line, without its trailing newline.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let idx = line.checked_sub(1)?;
        let start = *self.starts.get(idx)?;
        let end = self
            .starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(source.len());
        source.get(start..end).map(|l| l.trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }

    #[test]
    fn multi_line_lookup() {
        let src = "class A\n{\n    int x;\n}";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_count(), 4);
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.offset_to_line_col(8), (2, 1));
        // 'i' of `int`
        assert_eq!(lm.offset_to_line_col(14), (3, 5));
        assert_eq!(lm.line_text(src, 3), Some("    int x;"));
        assert_eq!(lm.line_text(src, 5), None);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let src = "a;\r\nb;\r\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_text(src, 1), Some("a;"));
        assert_eq!(lm.line_text(src, 2), Some("b;"));
        assert_eq!(lm.line_text(src, 3), Some(""));
    }

    #[test]
    fn span_helpers() {
        let outer = Span::new(2, 20);
        assert!(outer.contains(Span::new(4, 10)));
        assert!(!outer.contains(Span::new(0, 10)));
        assert_eq!(Span::new(4, 6).to(Span::new(1, 3)), Span::new(1, 6));
        assert_eq!(Span::new(3, 7).text("0123456789"), "3456");
    }
}
