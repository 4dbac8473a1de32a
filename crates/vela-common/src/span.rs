//! Source location tracking (byte offsets).

/// A half-open byte range into a unit's source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub len: u32,
}

impl Span {
    /// Span for synthesized nodes with no source position.
    pub const DUMMY: Self = Self { start: 0, len: 0 };

    pub const fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    pub const fn end(self) -> u32 {
        self.start + self.len
    }
}
