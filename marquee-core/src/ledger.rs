//! Recency-of-selection record used for overlap cycling and removal fallback

use crate::model::MarkerId;

/// Marker ids ordered by when they were last selected, most recent at the tail.
/// Each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickOrderLedger {
    order: Vec<MarkerId>,
}

impl ClickOrderLedger {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Move `id` to the tail, dropping any earlier occurrence
    pub fn record_selection(&mut self, id: MarkerId) {
        self.order.retain(|&existing| existing != id);
        self.order.push(id);
    }

    /// Most recently selected id
    pub fn tail(&self) -> Option<MarkerId> {
        self.order.last().copied()
    }

    pub fn pop_tail(&mut self) -> Option<MarkerId> {
        self.order.pop()
    }

    /// Position of `id`, or `None` if it has never been selected
    pub fn position(&self, id: MarkerId) -> Option<usize> {
        self.order.iter().position(|&existing| existing == id)
    }

    /// The entry recorded immediately before `id`
    pub fn predecessor_of(&self, id: MarkerId) -> Option<MarkerId> {
        match self.position(id)? {
            0 => None,
            pos => Some(self.order[pos - 1]),
        }
    }

    pub fn remove(&mut self, id: MarkerId) -> bool {
        let before = self.order.len();
        self.order.retain(|&existing| existing != id);
        self.order.len() != before
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.order.iter().copied()
    }
}
