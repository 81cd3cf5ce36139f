use tracing::debug;

use crate::host::{ActorId, StatSink, VariableStore};
use crate::ledger::Entry;

/// Tentative allocation of proficiency points, held while the player adjusts
/// an entry and applied only on [`SpendSession::commit`]. Never persisted.
///
/// Every mutating transition silently refuses when its guard fails: the
/// session never errors and never leaves `pending_points` out of step with
/// the price table slots consumed by `pending_levels`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpendSession {
    pending_levels: u32,
    pending_points: u32,
}

impl SpendSession {
    pub fn pending_levels(&self) -> u32 {
        self.pending_levels
    }

    pub fn pending_points(&self) -> u32 {
        self.pending_points
    }

    /// Stages one more level. Refuses past `max_level` or when the next
    /// slot's price exceeds the points still uncommitted.
    pub fn increment(&mut self, entry: &Entry, current_level: u32, available_points: u32) -> bool {
        if current_level + self.pending_levels >= entry.max_level {
            return false;
        }
        let price = entry.price_at(current_level + self.pending_levels);
        if price > available_points.saturating_sub(self.pending_points) {
            return false;
        }
        self.pending_levels += 1;
        self.pending_points += price;
        true
    }

    /// Backs out the most recently staged level, refunding its price.
    pub fn decrement(&mut self, entry: &Entry, current_level: u32) -> bool {
        if self.pending_levels == 0 {
            return false;
        }
        let price = entry.price_at(current_level + self.pending_levels - 1);
        self.pending_levels -= 1;
        self.pending_points = self.pending_points.saturating_sub(price);
        true
    }

    /// Applies the staged allocation: per-level stat grants, the entry's
    /// level counter, and the owning actor's points balance, then resets.
    /// Refuses when nothing is staged.
    pub fn commit(
        &mut self,
        entry: &Entry,
        actor: ActorId,
        points: &mut u32,
        variables: &mut dyn VariableStore,
        stats: &mut dyn StatSink,
    ) -> bool {
        if self.pending_points == 0 {
            return false;
        }
        let Some(level_key) = entry.level_key else {
            return false;
        };

        let current_level = variables.value(level_key).max(0) as u32;
        for level in current_level..current_level + self.pending_levels {
            for grant in entry.grants_at(level) {
                stats.grant_stat(actor, grant.stat, grant.amount);
            }
        }
        variables.set_value(level_key, (current_level + self.pending_levels) as i32);
        *points = points.saturating_sub(self.pending_points);
        debug!(
            entry = %entry.id,
            levels = self.pending_levels,
            spent = self.pending_points,
            "committed proficiency spend"
        );
        self.pending_levels = 0;
        self.pending_points = 0;
        true
    }

    /// Discards the staged allocation without applying anything.
    pub fn cancel(&mut self) {
        self.pending_levels = 0;
        self.pending_points = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::{TestStats, TestVariables};
    use crate::host::{StatId, VariableKey};

    fn sample_entry() -> Entry {
        let mut entry = Entry::note("swords", "Swordplay", "Swing harder.");
        entry.max_level = 10;
        entry.level_key = Some(VariableKey(7));
        entry.price_table = (1..=10).collect();
        entry
    }

    #[test]
    fn pending_points_track_consumed_price_slots() {
        let entry = sample_entry();
        let mut session = SpendSession::default();
        assert!(session.increment(&entry, 0, 100));
        assert!(session.increment(&entry, 0, 100));
        assert!(session.increment(&entry, 0, 100));
        // Slots 0..3 cost 1 + 2 + 3.
        assert_eq!(session.pending_points(), 6);
        assert!(session.decrement(&entry, 0));
        assert_eq!(session.pending_points(), 3);
        assert!(session.decrement(&entry, 0));
        assert!(session.decrement(&entry, 0));
        assert_eq!(session.pending_points(), 0);
        assert!(!session.decrement(&entry, 0));
    }

    #[test]
    fn increment_refuses_at_max_level() {
        let mut entry = sample_entry();
        entry.max_level = 2;
        let mut session = SpendSession::default();
        assert!(session.increment(&entry, 1, 100));
        assert!(!session.increment(&entry, 1, 100));
        assert_eq!(session.pending_levels(), 1);
    }

    #[test]
    fn three_points_buy_exactly_two_levels() {
        // Price table 1,2,3,... and a 3 point balance.
        let entry = sample_entry();
        let mut variables = TestVariables::default();
        let mut stats = TestStats::default();
        let mut points = 3u32;
        let mut session = SpendSession::default();

        assert!(session.increment(&entry, 0, points));
        assert!(session.increment(&entry, 0, points));
        assert!(!session.increment(&entry, 0, points), "cost 3 > remaining 0");

        assert!(session.commit(&entry, ActorId(1), &mut points, &mut variables, &mut stats));
        assert_eq!(variables.value(VariableKey(7)), 2);
        assert_eq!(points, 0);
        assert_eq!(session, SpendSession::default());
    }

    #[test]
    fn commit_refuses_with_nothing_staged() {
        let entry = sample_entry();
        let mut variables = TestVariables::default();
        let mut stats = TestStats::default();
        let mut points = 5u32;
        let mut session = SpendSession::default();
        assert!(!session.commit(&entry, ActorId(1), &mut points, &mut variables, &mut stats));
        assert_eq!(points, 5);
    }

    #[test]
    fn commit_applies_stat_grants_per_bought_level() {
        let mut entry = sample_entry();
        entry.price_table = vec![1, 1, 1];
        entry.stat_grants = vec![
            vec![crate::ledger::StatGrant {
                stat: StatId(2),
                amount: 5,
            }],
            vec![],
            vec![crate::ledger::StatGrant {
                stat: StatId(3),
                amount: 1,
            }],
        ];
        let mut variables = TestVariables::default();
        let mut stats = TestStats::default();
        let mut points = 10u32;
        let mut session = SpendSession::default();
        for _ in 0..3 {
            assert!(session.increment(&entry, 0, points));
        }
        assert!(session.commit(&entry, ActorId(4), &mut points, &mut variables, &mut stats));
        assert_eq!(
            stats.grants,
            vec![(ActorId(4), StatId(2), 5), (ActorId(4), StatId(3), 1)]
        );
    }

    #[test]
    fn cancel_discards_without_applying() {
        let entry = sample_entry();
        let mut session = SpendSession::default();
        assert!(session.increment(&entry, 0, 10));
        session.cancel();
        assert_eq!(session, SpendSession::default());
    }

    #[test]
    fn level_never_exceeds_max_after_commit() {
        let mut entry = sample_entry();
        entry.max_level = 3;
        let mut variables = TestVariables::default();
        let mut stats = TestStats::default();
        variables.set_value(VariableKey(7), 2);
        let mut points = 100u32;
        let mut session = SpendSession::default();
        assert!(session.increment(&entry, 2, points));
        assert!(!session.increment(&entry, 2, points));
        assert!(session.commit(&entry, ActorId(1), &mut points, &mut variables, &mut stats));
        assert_eq!(variables.value(VariableKey(7)), 3);
    }
}
