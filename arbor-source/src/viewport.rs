/// The part of the visible sequence a viewer currently renders.
///
/// Supplied by the viewer; adapters only react to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportRange {
    pub start: usize,
    pub count: usize,
}

impl ViewportRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.count)
    }

    /// Rows of `nodes` inside the range, clamped to the slice bounds.
    pub fn window<'a, F>(&self, nodes: &'a [F]) -> &'a [F] {
        let start = self.start.min(nodes.len());
        let end = self.end().min(nodes.len());
        &nodes[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::ViewportRange;

    #[test]
    fn window_clamps_to_available_rows() {
        let rows = [0, 1, 2, 3, 4];

        assert_eq!(ViewportRange::new(1, 2).window(&rows), &[1, 2]);
        assert_eq!(ViewportRange::new(3, 10).window(&rows), &[3, 4]);
        assert!(ViewportRange::new(9, 2).window(&rows).is_empty());
    }

    #[test]
    fn end_saturates() {
        assert_eq!(ViewportRange::new(usize::MAX, 4).end(), usize::MAX);
    }
}
