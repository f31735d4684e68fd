use super::lines::Line;

/// Forward-only position over one page's lines.
pub struct LineCursor<'a> {
    lines: &'a [Line],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [Line]) -> Self {
        LineCursor { lines, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Line> {
        self.lines.get(self.pos)
    }

    /// Return the current line and step past it.
    pub fn advance(&mut self) -> Option<&'a Line> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line)
    }

    /// Lines not yet consumed, current one included.
    pub fn remaining(&self) -> &'a [Line] {
        &self.lines[self.pos.min(self.lines.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(rank, t)| Line {
                text: t.to_string(),
                page: 0,
                rank,
            })
            .collect()
    }

    #[test]
    fn peek_does_not_move() {
        let ls = lines(&["a", "b"]);
        let cur = LineCursor::new(&ls);
        assert_eq!(cur.peek().map(|l| l.text.as_str()), Some("a"));
        assert_eq!(cur.peek().map(|l| l.text.as_str()), Some("a"));
        assert_eq!(cur.remaining().len(), 2);
    }

    #[test]
    fn advance_to_end() {
        let ls = lines(&["a", "b"]);
        let mut cur = LineCursor::new(&ls);
        assert_eq!(cur.advance().map(|l| l.rank), Some(0));
        assert_eq!(cur.remaining().len(), 1);
        assert_eq!(cur.advance().map(|l| l.rank), Some(1));
        assert!(cur.advance().is_none());
        assert!(cur.peek().is_none());
        assert!(cur.remaining().is_empty());
    }
}
