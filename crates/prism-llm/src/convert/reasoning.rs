//! Streaming extraction of inline `<think>…</think>` reasoning
//!
//! Some vendors serve DeepSeek-R1 models that emit reasoning inline in the
//! text stream rather than as a distinct stream-part type. This matcher
//! splits those text deltas into reasoning and answer chunks, handling
//! tags split across chunk boundaries.

use crate::types::StreamChunk;

const OPENING_TAG: &str = "<think>";
const CLOSING_TAG: &str = "</think>";

/// Stateful tag matcher over a stream of text deltas
#[derive(Debug, Default)]
pub struct ThinkTagParser {
    buffer: String,
    inside_tag: bool,
}

impl ThinkTagParser {
    /// Create a parser positioned outside any tag
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one text delta, yielding reasoning and text chunks
    pub fn push(&mut self, delta: &str) -> Vec<StreamChunk> {
        self.buffer.push_str(delta);
        let mut chunks = Vec::new();

        loop {
            let tag = if self.inside_tag { CLOSING_TAG } else { OPENING_TAG };

            let Some(start) = potential_tag_start(&self.buffer, tag) else {
                // No tag in sight; flush everything buffered
                if !self.buffer.is_empty() {
                    chunks.push(self.emit(self.buffer.clone()));
                    self.buffer.clear();
                }
                break;
            };

            if start > 0 {
                chunks.push(self.emit(self.buffer[..start].to_owned()));
            }

            if start + tag.len() <= self.buffer.len() {
                // Complete tag; consume it and switch context
                self.buffer = self.buffer[start + tag.len()..].to_owned();
                self.inside_tag = !self.inside_tag;
            } else {
                // Possible tag prefix at the end of the buffer; hold it back
                self.buffer = self.buffer[start..].to_owned();
                break;
            }
        }

        chunks
    }

    /// Flush any held-back text once the stream has ended
    ///
    /// A partial tag that never completed is surfaced as ordinary content.
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let buffered = std::mem::take(&mut self.buffer);
        let chunk = self.emit(buffered);
        vec![chunk]
    }

    fn emit(&self, text: String) -> StreamChunk {
        if self.inside_tag {
            StreamChunk::Reasoning { text, signature: None }
        } else {
            StreamChunk::Text { text }
        }
    }
}

/// Index where `tag` starts, or might start, in `text`
///
/// Returns the position of a complete occurrence, or of a suffix of `text`
/// that is a prefix of `tag` (a tag split across chunk boundaries).
fn potential_tag_start(text: &str, tag: &str) -> Option<usize> {
    if let Some(index) = text.find(tag) {
        return Some(index);
    }

    text.char_indices()
        .rev()
        .take(tag.len())
        .map(|(i, _)| i)
        .filter(|&i| tag.starts_with(&text[i..]))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasoning(text: &str) -> StreamChunk {
        StreamChunk::Reasoning {
            text: text.to_owned(),
            signature: None,
        }
    }

    fn text(text: &str) -> StreamChunk {
        StreamChunk::Text { text: text.to_owned() }
    }

    #[test]
    fn splits_reasoning_from_answer() {
        let mut parser = ThinkTagParser::new();
        assert_eq!(parser.push("<think>Thinking..."), vec![reasoning("Thinking...")]);
        assert_eq!(parser.push("</think>Hello"), vec![text("Hello")]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn tag_split_across_chunks() {
        let mut parser = ThinkTagParser::new();
        assert!(parser.push("<thi").is_empty());
        assert_eq!(parser.push("nk>deep</th"), vec![reasoning("deep")]);
        assert_eq!(parser.push("ink>done"), vec![text("done")]);
    }

    #[test]
    fn plain_text_passes_through() {
        let mut parser = ThinkTagParser::new();
        assert_eq!(parser.push("no tags here"), vec![text("no tags here")]);
    }

    #[test]
    fn unclosed_tag_flushes_as_reasoning() {
        let mut parser = ThinkTagParser::new();
        assert_eq!(parser.push("<think>still going"), vec![reasoning("still going")]);
        assert!(parser.push(" more").len() == 1);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn dangling_partial_tag_flushes_on_finish() {
        let mut parser = ThinkTagParser::new();
        assert!(parser.push("<thi").is_empty());
        assert_eq!(parser.finish(), vec![text("<thi")]);
    }

    #[test]
    fn angle_bracket_in_text_is_not_swallowed() {
        let mut parser = ThinkTagParser::new();
        let chunks = parser.push("a < b");
        let flushed = parser.finish();
        let combined: String = chunks
            .into_iter()
            .chain(flushed)
            .map(|c| match c {
                StreamChunk::Text { text } => text,
                _ => String::new(),
            })
            .collect();
        assert_eq!(combined, "a < b");
    }
}
