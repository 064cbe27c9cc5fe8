use std::collections::BTreeSet;

pub const FIRST_TEN: &str = "First 10";
pub const HALF_CENTURY: &str = "Half Century";
pub const CENTURY_MASTER: &str = "Century Master";
pub const WEEK_WARRIOR: &str = "Week Warrior";
pub const MONTHLY_MASTER: &str = "Monthly Master";

/// Compute the badge set after a successful expense add. Pure function of
/// the prior badges, the new total expense count, and the post-increment
/// streak, so it stays testable apart from any storage.
///
/// Count badges fire on exact totals only: restoring a snapshot that jumps
/// past a threshold never awards it retroactively. Badges are one-way; the
/// result always contains the prior set.
pub fn derive_badges(
    prior: &BTreeSet<String>,
    expense_count: usize,
    streak: u32,
) -> BTreeSet<String> {
    let mut badges = prior.clone();

    let count_award = match expense_count {
        10 => Some(FIRST_TEN),
        50 => Some(HALF_CENTURY),
        100 => Some(CENTURY_MASTER),
        _ => None,
    };
    if let Some(badge) = count_award {
        badges.insert(badge.to_string());
    }

    if streak >= 7 {
        badges.insert(WEEK_WARRIOR.to_string());
    }
    if streak >= 30 {
        badges.insert(MONTHLY_MASTER.to_string());
    }

    badges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn count_badges_fire_on_exact_totals() {
        assert!(!derive_badges(&empty(), 9, 0).contains(FIRST_TEN));
        assert!(derive_badges(&empty(), 10, 0).contains(FIRST_TEN));
        assert!(!derive_badges(&empty(), 11, 0).contains(FIRST_TEN));
        assert!(derive_badges(&empty(), 50, 0).contains(HALF_CENTURY));
        assert!(derive_badges(&empty(), 100, 0).contains(CENTURY_MASTER));
    }

    #[test]
    fn jumping_past_a_threshold_is_not_retroactive() {
        let badges = derive_badges(&empty(), 37, 1);
        assert!(!badges.contains(FIRST_TEN));
        assert!(!badges.contains(HALF_CENTURY));
    }

    #[test]
    fn streak_badges_fire_at_thresholds() {
        assert!(!derive_badges(&empty(), 1, 6).contains(WEEK_WARRIOR));
        assert!(derive_badges(&empty(), 1, 7).contains(WEEK_WARRIOR));
        assert!(derive_badges(&empty(), 1, 12).contains(WEEK_WARRIOR));
        assert!(derive_badges(&empty(), 1, 30).contains(MONTHLY_MASTER));
    }

    #[test]
    fn badges_are_never_revoked() {
        let mut prior = empty();
        prior.insert(FIRST_TEN.to_string());
        prior.insert(WEEK_WARRIOR.to_string());
        let badges = derive_badges(&prior, 11, 1);
        assert!(badges.contains(FIRST_TEN));
        assert!(badges.contains(WEEK_WARRIOR));
    }
}
