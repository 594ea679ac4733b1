/// A source location: file ID + byte offset range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub file_id: u16,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    pub fn dummy() -> Self {
        Self {
            file_id: 0,
            start: 0,
            end: 0,
        }
    }

    /// Zero-width span at `offset`.
    pub fn point(file_id: u16, offset: u32) -> Self {
        Self::new(file_id, offset, offset)
    }

    pub fn merge(self, other: Span) -> Span {
        debug_assert_eq!(self.file_id, other.file_id);
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    /// True if the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice the original text covered by this span.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        source.get(self.range()).unwrap_or("")
    }
}

/// A value annotated with its source span.
#[derive(Clone, Debug)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self {
            node,
            span: Span::dummy(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_covers_both() {
        let a = Span::new(0, 4, 9);
        let b = Span::new(0, 2, 6);
        assert_eq!(a.merge(b), Span::new(0, 2, 9));
    }

    #[test]
    fn test_overlaps_is_strict_on_touching_ends() {
        let a = Span::new(0, 0, 5);
        assert!(!a.overlaps(&Span::new(0, 5, 8)));
        assert!(a.overlaps(&Span::new(0, 4, 8)));
        assert!(!Span::point(0, 3).overlaps(&Span::point(0, 3)));
    }

    #[test]
    fn test_text_slices_source() {
        let src = "int main() {}";
        assert_eq!(Span::new(0, 4, 8).text(src), "main");
        assert_eq!(Span::new(0, 40, 48).text(src), "");
    }
}
