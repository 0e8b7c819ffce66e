use crate::view::ContactList;
use std::collections::HashMap;

/// Per-contact unread counters for the lifetime of one login.
#[derive(Debug, Default, Clone)]
pub struct UnreadTracker {
    counts: HashMap<i64, u32>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, contact_id: i64) -> u32 {
        self.counts.get(&contact_id).copied().unwrap_or(0)
    }

    pub fn reset(&mut self, contact_id: i64) {
        self.counts.insert(contact_id, 0);
    }

    pub fn increment(&mut self, contact_id: i64) {
        *self.counts.entry(contact_id).or_insert(0) += 1;
    }

    /// Drops the counter of a contact that no longer exists.
    pub fn forget(&mut self, contact_id: i64) {
        self.counts.remove(&contact_id);
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Syncs every badge in `list` to the current counts.
    pub fn render(&self, list: &mut ContactList) {
        for row in &mut list.rows {
            row.badge = self.count(row.contact_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Contact;
    use crate::view::ContactRow;

    fn list(ids: &[i64]) -> ContactList {
        ContactList {
            rows: ids
                .iter()
                .map(|&id| ContactRow::new(&Contact { id, username: format!("u{id}"), profile_pic: None }, 9))
                .collect(),
        }
    }

    #[test]
    fn unrecorded_contact_reads_zero() {
        let tracker = UnreadTracker::new();
        assert_eq!(tracker.count(12), 0);
    }

    #[test]
    fn increment_then_reset() {
        let mut tracker = UnreadTracker::new();
        tracker.increment(1);
        tracker.increment(1);
        tracker.increment(2);
        assert_eq!(tracker.count(1), 2);
        tracker.reset(1);
        assert_eq!(tracker.count(1), 0);
        assert_eq!(tracker.count(2), 1);
    }

    #[test]
    fn render_overwrites_every_badge() {
        let mut tracker = UnreadTracker::new();
        tracker.increment(2);
        let mut contacts = list(&[1, 2, 3]);
        tracker.render(&mut contacts);
        let badges: Vec<u32> = contacts.rows.iter().map(|r| r.badge).collect();
        assert_eq!(badges, vec![0, 1, 0]);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut tracker = UnreadTracker::new();
        tracker.increment(5);
        tracker.clear();
        assert_eq!(tracker.count(5), 0);
    }

    #[test]
    fn forget_drops_only_that_contact() {
        let mut tracker = UnreadTracker::new();
        tracker.increment(1);
        tracker.increment(2);
        tracker.forget(1);
        assert_eq!(tracker.count(1), 0);
        assert_eq!(tracker.count(2), 1);
    }
}
