//! Size cap enforcement.

/// Decides how many entries to drop once the store outgrows its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    max_entries: usize,
    percent: u8,
}

impl EvictionPolicy {
    /// Creates a policy. A `max_entries` of zero disables eviction.
    pub const fn new(max_entries: usize, percent: u8) -> Self {
        Self {
            max_entries,
            percent,
        }
    }

    /// Number of entries to evict from a store holding `total` entries.
    ///
    /// Zero while the cap holds. Otherwise `percent` of `total`, rounded
    /// down, and never less than one.
    pub fn target(&self, total: usize) -> usize {
        if self.max_entries == 0 || total <= self.max_entries {
            return 0;
        }
        (total * usize::from(self.percent) / 100).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_evicts() {
        let policy = EvictionPolicy::new(0, 5);
        assert_eq!(policy.target(1_000_000), 0);
    }

    #[test]
    fn within_cap_evicts_nothing() {
        let policy = EvictionPolicy::new(20, 5);
        assert_eq!(policy.target(0), 0);
        assert_eq!(policy.target(20), 0);
    }

    #[test]
    fn first_overflow_evicts_at_least_one() {
        let policy = EvictionPolicy::new(20, 5);
        // floor(21 * 0.05) == 1
        assert_eq!(policy.target(21), 1);

        let small = EvictionPolicy::new(3, 5);
        assert_eq!(small.target(4), 1);
    }

    #[test]
    fn large_overflow_evicts_percentage() {
        let policy = EvictionPolicy::new(1000, 5);
        assert_eq!(policy.target(1001), 50);
        assert_eq!(EvictionPolicy::new(1000, 10).target(2000), 200);
    }
}
