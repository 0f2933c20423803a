/// Per-subprocess worker allowance so that `selected` subprocesses running
/// their own internal workers stay within `budget` overall.
pub(crate) fn worker_allowance(budget: usize, selected: usize) -> usize {
    if selected == 0 {
        return 1;
    }
    (budget / selected).max(1)
}

#[cfg(test)]
mod tests {
    use super::worker_allowance;

    #[test]
    fn no_targets_resolves_to_one() {
        assert_eq!(worker_allowance(128, 0), 1);
        assert_eq!(worker_allowance(0, 0), 1);
    }

    #[test]
    fn splits_budget_evenly() {
        assert_eq!(worker_allowance(128, 1), 128);
        assert_eq!(worker_allowance(128, 2), 64);
        assert_eq!(worker_allowance(128, 3), 42);
    }

    #[test]
    fn never_drops_below_one() {
        assert_eq!(worker_allowance(128, 129), 1);
        assert_eq!(worker_allowance(128, 1000), 1);
    }

    #[test]
    fn sum_of_allowances_stays_within_budget() {
        for selected in 1..=128 {
            assert!(selected * worker_allowance(128, selected) <= 128);
        }
        for selected in 0..=300 {
            let expected = if selected == 0 { 1 } else { (128 / selected).max(1) };
            assert_eq!(worker_allowance(128, selected), expected);
        }
    }
}
