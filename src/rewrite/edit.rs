//! Deferred text edits keyed by original-source byte offsets.
//!
//! Rewriters record replacements and insertions while walking an
//! immutable tree; `render` applies all of them in one forward pass, so
//! the order in which edits were recorded never changes the output.

use thiserror::Error;

use crate::span::Span;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(
        "edit at {}..{} overlaps an earlier edit at {}..{}",
        .new.start, .new.end, .existing.start, .existing.end
    )]
    Overlap { existing: Span, new: Span },
    #[error("edit at {}..{} is outside the {len}-byte source", .span.start, .span.end)]
    OutOfBounds { span: Span, len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Placement {
    Before,
    After,
}

#[derive(Clone, Debug)]
struct Replacement {
    span: Span,
    text: String,
}

#[derive(Clone, Debug)]
struct Insertion {
    offset: u32,
    placement: Placement,
    seq: usize,
    text: String,
}

/// Pairwise non-overlapping replacements plus point insertions.
#[derive(Clone, Debug, Default)]
pub struct EditBuffer {
    replacements: Vec<Replacement>,
    insertions: Vec<Insertion>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source text covered by `span`.
    ///
    /// Recording the same replacement twice is a no-op. A replacement
    /// that shares bytes with an earlier one, or that would swallow an
    /// insertion point, is rejected.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) -> Result<(), EditError> {
        let text = text.into();
        if span.is_empty() {
            return self.insert(span.start, Placement::After, text);
        }
        for existing in &self.replacements {
            if existing.span == span && existing.text == text {
                return Ok(());
            }
            if existing.span == span || existing.span.overlaps(&span) {
                return Err(EditError::Overlap {
                    existing: existing.span,
                    new: span,
                });
            }
        }
        if let Some(ins) = self
            .insertions
            .iter()
            .find(|ins| span.start < ins.offset && ins.offset < span.end)
        {
            return Err(EditError::Overlap {
                existing: Span::point(span.file_id, ins.offset),
                new: span,
            });
        }
        self.replacements.push(Replacement { span, text });
        Ok(())
    }

    /// Insert `text` at `offset`, ahead of any `insert_after` text there.
    pub fn insert_before(&mut self, offset: u32, text: impl Into<String>) -> Result<(), EditError> {
        self.insert(offset, Placement::Before, text.into())
    }

    /// Insert `text` at `offset`, behind any `insert_before` text there.
    pub fn insert_after(&mut self, offset: u32, text: impl Into<String>) -> Result<(), EditError> {
        self.insert(offset, Placement::After, text.into())
    }

    fn insert(&mut self, offset: u32, placement: Placement, text: String) -> Result<(), EditError> {
        if let Some(rep) = self
            .replacements
            .iter()
            .find(|rep| rep.span.start < offset && offset < rep.span.end)
        {
            return Err(EditError::Overlap {
                existing: rep.span,
                new: Span::point(rep.span.file_id, offset),
            });
        }
        let seq = self.insertions.len();
        self.insertions.push(Insertion {
            offset,
            placement,
            seq,
            text,
        });
        Ok(())
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.replacements.len() + self.insertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every edit to `source`.
    ///
    /// Insertions at an offset come before a replacement starting there;
    /// within one placement class recording order is kept.
    pub fn render(&self, source: &str) -> Result<String, EditError> {
        let len = source.len();
        let in_bounds = |offset: u32| {
            let offset = offset as usize;
            offset <= len && source.is_char_boundary(offset)
        };
        for rep in &self.replacements {
            if !in_bounds(rep.span.start) || !in_bounds(rep.span.end) {
                return Err(EditError::OutOfBounds {
                    span: rep.span,
                    len,
                });
            }
        }
        for ins in &self.insertions {
            if !in_bounds(ins.offset) {
                return Err(EditError::OutOfBounds {
                    span: Span::point(0, ins.offset),
                    len,
                });
            }
        }

        let mut replacements: Vec<&Replacement> = self.replacements.iter().collect();
        replacements.sort_by_key(|rep| rep.span.start);
        let mut insertions: Vec<&Insertion> = self.insertions.iter().collect();
        insertions.sort_by_key(|ins| (ins.offset, ins.placement, ins.seq));

        let mut out = String::with_capacity(len + self.text_len());
        let mut cursor = 0usize;
        let mut pending = insertions.into_iter().peekable();
        for rep in replacements {
            let start = rep.span.start as usize;
            while let Some(ins) = pending.next_if(|ins| ins.offset as usize <= start) {
                let offset = ins.offset as usize;
                out.push_str(&source[cursor..offset]);
                out.push_str(&ins.text);
                cursor = offset;
            }
            out.push_str(&source[cursor..start]);
            out.push_str(&rep.text);
            cursor = rep.span.end as usize;
        }
        for ins in pending {
            let offset = ins.offset as usize;
            out.push_str(&source[cursor..offset]);
            out.push_str(&ins.text);
            cursor = offset;
        }
        out.push_str(&source[cursor..]);
        Ok(out)
    }

    fn text_len(&self) -> usize {
        self.replacements.iter().map(|r| r.text.len()).sum::<usize>()
            + self.insertions.iter().map(|i| i.text.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32) -> Span {
        Span::new(0, start, end)
    }

    #[test]
    fn test_replace_and_render() {
        let source = "int x = a + b;";
        let mut edits = EditBuffer::new();
        edits.replace(span(8, 9), "left").unwrap();
        edits.replace(span(12, 13), "right").unwrap();
        assert_eq!(edits.render(source).unwrap(), "int x = left + right;");
    }

    #[test]
    fn test_recording_order_does_not_matter() {
        let source = "a(b, c, d);";
        let edits_in = |order: &[usize]| {
            let all = [(0, 1, "f"), (2, 3, "x"), (5, 6, "y"), (8, 9, "z")];
            let mut edits = EditBuffer::new();
            for &i in order {
                let (s, e, t) = all[i];
                edits.replace(span(s, e), t).unwrap();
            }
            edits.insert_before(0, "/*pre*/").unwrap();
            edits.render(source).unwrap()
        };
        let forward = edits_in(&[0, 1, 2, 3]);
        assert_eq!(forward, "/*pre*/f(x, y, z);");
        assert_eq!(edits_in(&[3, 2, 1, 0]), forward);
        assert_eq!(edits_in(&[2, 0, 3, 1]), forward);
    }

    #[test]
    fn test_overlap_rejected() {
        let mut edits = EditBuffer::new();
        edits.replace(span(4, 10), "x").unwrap();
        assert!(matches!(
            edits.replace(span(8, 12), "y"),
            Err(EditError::Overlap { .. })
        ));
        assert!(matches!(
            edits.replace(span(4, 10), "different"),
            Err(EditError::Overlap { .. })
        ));
        assert!(matches!(
            edits.insert_after(6, "z"),
            Err(EditError::Overlap { .. })
        ));
        // Touching ranges do not overlap.
        edits.replace(span(10, 12), "w").unwrap();
        edits.insert_after(4, "at start is fine").unwrap();
    }

    #[test]
    fn test_identical_replacement_is_idempotent() {
        let mut edits = EditBuffer::new();
        edits.replace(span(0, 5), "cl_mem ").unwrap();
        edits.replace(span(0, 5), "cl_mem ").unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits.render("float *a;").unwrap(), "cl_mem *a;");
    }

    #[test]
    fn test_insertion_ordering_at_one_offset() {
        let source = "{}";
        let mut edits = EditBuffer::new();
        edits.insert_after(1, "A1").unwrap();
        edits.insert_before(1, "B1").unwrap();
        edits.insert_after(1, "A2").unwrap();
        edits.insert_before(1, "B2").unwrap();
        assert_eq!(edits.render(source).unwrap(), "{B1B2A1A2}");
    }

    #[test]
    fn test_insertions_precede_replacement_at_same_offset() {
        let mut edits = EditBuffer::new();
        edits.replace(span(1, 2), "X").unwrap();
        edits.insert_after(1, "<").unwrap();
        edits.insert_after(2, ">").unwrap();
        assert_eq!(edits.render("abc").unwrap(), "a<X>c");
    }

    #[test]
    fn test_out_of_bounds() {
        let mut edits = EditBuffer::new();
        edits.replace(span(2, 40), "x").unwrap();
        assert!(matches!(
            edits.render("short"),
            Err(EditError::OutOfBounds { len: 5, .. })
        ));
    }

    #[test]
    fn test_empty_buffer_renders_source() {
        let edits = EditBuffer::new();
        assert!(edits.is_empty());
        assert_eq!(edits.render("unchanged\n").unwrap(), "unchanged\n");
    }
}
