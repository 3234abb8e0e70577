//! Transcript stream normalization.
//!
//! Recognition events arrive as interleaved partial and final hypotheses.
//! The [`UtteranceBuffer`] accumulates only final fragments for the current
//! utterance; partials are combined for display but never stored. There is no
//! timing or network logic here, pure accumulation only.

/// Accumulates finalized transcript fragments for the current utterance.
///
/// At most one buffer exists per session. The buffer is cleared by [`take`]
/// when a turn is dispatched for processing or abandoned.
///
/// [`take`]: UtteranceBuffer::take
#[derive(Debug, Default)]
pub struct UtteranceBuffer {
    text: String,
}

impl UtteranceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a final fragment and return the updated buffer content.
    ///
    /// Whitespace-only fragments are ignored and return `None`.
    pub fn push_final(&mut self, fragment: &str) -> Option<&str> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return None;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(fragment);
        Some(&self.text)
    }

    /// Combine the buffer with an interim fragment for live display.
    ///
    /// Does not mutate the buffer; partial hypotheses are routinely replaced
    /// by the recognizer and must never be accumulated.
    pub fn preview(&self, partial: &str) -> String {
        let partial = partial.trim();
        if partial.is_empty() {
            return self.text.clone();
        }
        if self.text.is_empty() {
            partial.to_string()
        } else {
            format!("{} {}", self.text, partial)
        }
    }

    /// Take the accumulated content, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_final_accumulates_with_separator() {
        let mut buffer = UtteranceBuffer::new();
        assert_eq!(buffer.push_final("no"), Some("no"));
        assert_eq!(buffer.push_final("wait actually yes"), Some("no wait actually yes"));
        assert_eq!(buffer.as_str(), "no wait actually yes");
    }

    #[test]
    fn test_whitespace_fragments_ignored() {
        let mut buffer = UtteranceBuffer::new();
        assert_eq!(buffer.push_final("   "), None);
        assert_eq!(buffer.push_final("\t\n"), None);
        assert!(buffer.is_empty());

        buffer.push_final("hello");
        assert_eq!(buffer.push_final(" "), None);
        assert_eq!(buffer.as_str(), "hello");
    }

    #[test]
    fn test_fragments_trimmed_before_append() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("  I think  ");
        buffer.push_final(" tariffs help ");
        assert_eq!(buffer.as_str(), "I think tariffs help");
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("I think");
        assert_eq!(buffer.preview("tariffs"), "I think tariffs");
        assert_eq!(buffer.as_str(), "I think");

        assert_eq!(buffer.preview(""), "I think");
        assert_eq!(buffer.preview("   "), "I think");
    }

    #[test]
    fn test_preview_on_empty_buffer() {
        let buffer = UtteranceBuffer::new();
        assert_eq!(buffer.preview("hello"), "hello");
        assert_eq!(buffer.preview(""), "");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("one");
        buffer.push_final("two");
        assert_eq!(buffer.take(), "one two");
        assert!(buffer.is_empty());
        assert_eq!(buffer.take(), "");
    }
}
