//! Unicode String facility (§3.2).
//!
//! A [`TangString`] is a UTF-8 byte buffer plus a grapheme count and a sequence of
//! (type, starting grapheme offset) tags that survive concatenation, so a string built
//! from several differently-encoded pieces (e.g. a template literal concatenated with
//! a percent-encoded URL fragment) still knows which byte ranges need which output
//! encoding. Substring/slice operations are grapheme-indexed, not byte-indexed.

use unicode_segmentation::UnicodeSegmentation;

/// Output-encoding tag for a contiguous run of graphemes within a [`TangString`].
///
/// The original C implementation (`examples/original_source/include/tang/unicodeString.h`)
/// only tracks `TRUSTED`/`UNTRUSTED`/`PERCENT`; the specification's Unicode String
/// section expands this to the five variants below, which is the authoritative set
/// for this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringType {
    Trusted,
    Untrusted,
    Percent,
    Html,
    Json,
}

/// One tagged region: `start` is a grapheme offset, inclusive, running until the next
/// tag's `start` (or the end of the string for the last tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeTag {
    kind: StringType,
    start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TangString {
    buffer: String,
    grapheme_offsets: Vec<usize>,
    tags: Vec<TypeTag>,
}

impl TangString {
    /// Builds a new string entirely tagged with one `StringType`.
    pub fn new(text: impl Into<String>, kind: StringType) -> Self {
        let buffer = text.into();
        let grapheme_offsets = Self::compute_offsets(&buffer);
        Self {
            buffer,
            grapheme_offsets,
            tags: vec![TypeTag { kind, start: 0 }],
        }
    }

    /// The canonical empty-string singleton payload (§3.2: "an empty-string singleton
    /// exists"); callers that need the flagged singleton use
    /// [`crate::value::Value::empty_string`] instead of constructing this directly.
    pub fn empty() -> Self {
        Self::new(String::new(), StringType::Trusted)
    }

    fn compute_offsets(buffer: &str) -> Vec<usize> {
        let mut offsets: Vec<usize> = buffer.grapheme_indices(true).map(|(i, _)| i).collect();
        offsets.push(buffer.len());
        offsets
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn grapheme_len(&self) -> usize {
        self.grapheme_offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn byte_offset(&self, grapheme_index: usize) -> usize {
        self.grapheme_offsets[grapheme_index.min(self.grapheme_offsets.len() - 1)]
    }

    /// Grapheme-indexed substring: `[start, start + count)`, clamped to the string's
    /// bounds. The returned string carries whichever tags overlap the slice, with
    /// offsets re-based to zero.
    pub fn substring(&self, start: usize, count: usize) -> Self {
        let len = self.grapheme_len();
        let start = start.min(len);
        let end = (start + count).min(len);
        let byte_start = self.byte_offset(start);
        let byte_end = self.byte_offset(end);
        let buffer = self.buffer[byte_start..byte_end].to_string();

        let mut tags: Vec<TypeTag> = self
            .tags
            .iter()
            .filter(|t| t.start < end)
            .map(|t| TypeTag {
                kind: t.kind,
                start: t.start.saturating_sub(start).min(end - start),
            })
            .collect();
        if tags.is_empty() {
            tags.push(TypeTag {
                kind: StringType::Trusted,
                start: 0,
            });
        }
        // Drop duplicate tags left at the same starting offset after clamping.
        tags.dedup_by_key(|t| t.start);

        let grapheme_offsets = Self::compute_offsets(&buffer);
        Self {
            buffer,
            grapheme_offsets,
            tags,
        }
    }

    /// Concatenates `self` and `other`, preserving both sides' tag boundaries so the
    /// combined string still remembers which regions are which encoding.
    pub fn concat(&self, other: &Self) -> Self {
        let mut buffer = self.buffer.clone();
        buffer.push_str(&other.buffer);

        let offset = self.grapheme_len();
        let mut tags = self.tags.clone();
        for tag in &other.tags {
            tags.push(TypeTag {
                kind: tag.kind,
                start: tag.start + offset,
            });
        }
        tags.dedup_by_key(|t| t.start);

        let grapheme_offsets = Self::compute_offsets(&buffer);
        Self {
            buffer,
            grapheme_offsets,
            tags,
        }
    }

    /// Returns the tag covering a given grapheme offset, used when re-encoding a
    /// string for output (e.g. percent-decoding only the `Percent`-tagged regions).
    pub fn tag_at(&self, grapheme_index: usize) -> StringType {
        self.tags
            .iter()
            .rev()
            .find(|t| t.start <= grapheme_index)
            .map(|t| t.kind)
            .unwrap_or(StringType::Trusted)
    }
}

impl std::fmt::Display for TangString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grapheme_length_counts_extended_clusters() {
        // "e\u{0301}" is a single grapheme cluster (e + combining acute) despite
        // being two Unicode scalar values.
        let s = TangString::new("e\u{0301}llo", StringType::Trusted);
        assert_eq!(s.grapheme_len(), 4);
    }

    #[test]
    fn substring_is_grapheme_indexed() {
        let s = TangString::new("hello", StringType::Trusted);
        let sub = s.substring(1, 3);
        assert_eq!(sub.as_str(), "ell");
    }

    #[test]
    fn concat_preserves_tag_boundaries() {
        let trusted = TangString::new("safe-", StringType::Trusted);
        let untrusted = TangString::new("input", StringType::Untrusted);
        let joined = trusted.concat(&untrusted);
        assert_eq!(joined.as_str(), "safe-input");
        assert_eq!(joined.tag_at(0), StringType::Trusted);
        assert_eq!(joined.tag_at(5), StringType::Untrusted);
    }

    #[test]
    fn empty_string_has_zero_length() {
        assert_eq!(TangString::empty().grapheme_len(), 0);
    }
}
