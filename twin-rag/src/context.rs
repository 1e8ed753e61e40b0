//! Context assembly: ranked hits → bounded, attributed text block.

use vector_store::Hit;

/// Separator between context lines.
pub const SEPARATOR: &str = "\n\n";

/// Ordered context lines, one per surviving hit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextBlock {
    lines: Vec<String>,
    /// Index into the assembled hits for each line.
    sources: Vec<usize>,
}

impl ContextBlock {
    pub fn from_lines(lines: Vec<String>) -> Self {
        let sources = (0..lines.len()).collect();
        Self { lines, sources }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Positions of the hits behind each line, in line order.
    pub fn sources(&self) -> &[usize] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with [`SEPARATOR`].
    pub fn render(&self) -> String {
        self.lines.join(SEPARATOR)
    }
}

/// Builds context blocks under a character budget.
#[derive(Clone, Copy, Debug)]
pub struct ContextAssembler {
    max_chars: usize,
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// `"{title}: {text}"` per hit (bare text without a title), dropping hits
    /// whose text is blank and keeping input order.
    ///
    /// Lines stop once the rendered block would exceed the budget; the first
    /// line is truncated instead of dropped.
    pub fn assemble(&self, hits: &[Hit]) -> ContextBlock {
        let mut lines = Vec::new();
        let mut sources = Vec::new();
        let mut used = 0usize;

        for (idx, hit) in hits.iter().enumerate() {
            let text = hit.text.trim();
            if text.is_empty() {
                continue;
            }
            let title = hit.title().trim();
            let line = if title.is_empty() {
                text.to_string()
            } else {
                format!("{title}: {text}")
            };

            let sep = if lines.is_empty() { 0 } else { SEPARATOR.len() };
            if used + sep + line.len() > self.max_chars {
                if lines.is_empty() && self.max_chars > 0 {
                    lines.push(safe_truncate(&line, self.max_chars).to_string());
                    sources.push(idx);
                }
                break;
            }
            used += sep + line.len();
            lines.push(line);
            sources.push(idx);
        }

        ContextBlock { lines, sources }
    }
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(meta: serde_json::Value) -> Hit {
        Hit::new(Some(0.5), meta.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn drops_empty_and_keeps_order() {
        let hits = vec![
            hit(json!({"section": "A"})),
            hit(json!({"title": "B", "text": "x"})),
            hit(json!({"title": "", "text": "y"})),
        ];
        assert_eq!(hits[0].title(), "A");
        assert_eq!(hits[0].text, "");

        let block = ContextAssembler::new(6000).assemble(&hits);
        assert_eq!(block.lines(), ["B: x", "y"]);
        assert_eq!(block.sources(), [1, 2]);
        assert_eq!(block.render(), "B: x\n\ny");
    }

    #[test]
    fn title_only_hit_is_kept_as_text() {
        // `title` doubles as display text when nothing else is present.
        let block = ContextAssembler::new(100).assemble(&[hit(json!({"title": "Solo"}))]);
        assert_eq!(block.lines(), ["Solo: Solo"]);
    }

    #[test]
    fn empty_hits_give_empty_block() {
        assert!(ContextAssembler::new(100).assemble(&[]).is_empty());
        assert!(
            ContextAssembler::new(100)
                .assemble(&[hit(json!({"text": "   "}))])
                .is_empty()
        );
    }

    #[test]
    fn budget_stops_and_truncates_first() {
        let hits = vec![hit(json!({"text": "aaaa"})), hit(json!({"text": "bbbb"}))];
        let cut = ContextAssembler::new(9).assemble(&hits);
        assert_eq!(cut.lines(), ["aaaa"]);
        assert_eq!(cut.sources(), [0]);
        assert_eq!(ContextAssembler::new(10).assemble(&hits).lines(), ["aaaa", "bbbb"]);
        let truncated = ContextAssembler::new(2).assemble(&hits);
        assert_eq!(truncated.lines(), ["aa"]);
        assert_eq!(truncated.sources(), [0]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(safe_truncate("héllo", 2), "h");
    }
}
