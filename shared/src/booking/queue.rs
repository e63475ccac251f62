//! Waitlist ordering rules
//!
//! Positions are stable arrival numbers scoped to a slot. They are never
//! renumbered when earlier entries leave the `waiting` state, so a queue may
//! read 2, 5, 6. A new entry always lands after every entry still waiting.

/// Position for a new entry given the positions currently `waiting` in the slot.
pub fn next_position<I>(waiting_positions: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    waiting_positions.into_iter().max().unwrap_or(0) + 1
}

/// Waiting entries in the same slot that are ahead of `position`.
pub fn people_ahead<I>(waiting_positions: I, position: i32) -> usize
where
    I: IntoIterator<Item = i32>,
{
    waiting_positions
        .into_iter()
        .filter(|p| *p < position)
        .count()
}

/// A notified entry lapses once its deadline has been reached.
pub fn is_lapsed(expires_at: Option<i64>, now_ms: i64) -> bool {
    expires_at.is_some_and(|deadline| deadline <= now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_registration_gets_n() {
        let mut waiting = Vec::new();
        for n in 1..=6 {
            let position = next_position(waiting.iter().copied());
            assert_eq!(position, n);
            waiting.push(position);
        }
    }

    #[test]
    fn positions_are_not_renumbered() {
        // 1 was promoted, 2 and 3 still wait
        assert_eq!(next_position([2, 3]), 4);
    }

    #[test]
    fn never_collides_with_a_waiting_entry() {
        // count + 1 would give 2 here and clash with the entry at 2
        assert_eq!(next_position([2]), 3);
    }

    #[test]
    fn empty_queue_restarts_at_one() {
        assert_eq!(next_position(std::iter::empty()), 1);
    }

    #[test]
    fn counts_people_ahead() {
        assert_eq!(people_ahead([2, 5, 6], 6), 2);
        assert_eq!(people_ahead([2, 5, 6], 2), 0);
    }

    #[test]
    fn lapse_boundary() {
        assert!(!is_lapsed(None, 100));
        assert!(!is_lapsed(Some(101), 100));
        assert!(is_lapsed(Some(100), 100));
        assert!(is_lapsed(Some(50), 100));
    }
}
