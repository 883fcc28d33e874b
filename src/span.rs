use std::ops::Range;

/// A location in the manifest: byte offset range into the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Span covering a byte range as reported by the XML parser.
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            start: range.start as u32,
            end: range.end as u32,
        }
    }

    /// Span of the (1-based) row/column position inside `source`.
    ///
    /// Points at a single byte; clamps to the end of the text.
    pub fn at_position(source: &str, row: u32, col: u32) -> Self {
        let mut offset = 0usize;
        for (i, line) in source.split_inclusive('\n').enumerate() {
            if i + 1 == row as usize {
                let col = (col as usize).saturating_sub(1);
                offset += line
                    .char_indices()
                    .nth(col)
                    .map(|(byte, _)| byte)
                    .unwrap_or(line.len());
                break;
            }
            offset += line.len();
        }
        let offset = offset.min(source.len()) as u32;
        Self::new(offset, offset.saturating_add(1).min(source.len() as u32))
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}
