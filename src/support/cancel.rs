use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide stop signal shared by every task. It only ever goes from
/// unset to set.
#[derive(Clone, Debug, Default)]
pub(crate) struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` only for the call that flipped it.
    pub(crate) fn cancel(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationFlag;
    use std::thread;

    #[test]
    fn flips_exactly_once() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());
        assert!(flag.cancel());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn clones_share_state_and_one_racer_wins() {
        let flag = CancellationFlag::new();
        let winners: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let flag = flag.clone();
                    scope.spawn(move || usize::from(flag.cancel()))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(0))
                .sum()
        });
        assert_eq!(winners, 1);
        assert!(flag.is_cancelled());
    }
}
