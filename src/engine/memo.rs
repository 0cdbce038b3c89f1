//! The memoization table. One [`MemoCache<T>`] per rule that opts into
//! memoization, keyed by start position. Rules whose outcome depends on the
//! current state-stack contents (anything that calls into
//! `check_no`/`check_ifnot`/`check_bol_skip`/`check_wspre`) must not use a
//! cache; only context-independent rules are memoized.

use std::cell::RefCell;
use std::collections::HashMap;

/// A memo table for a single rule, keyed by start position. `None` entries
/// record a prior failure at that position.
pub struct MemoCache<T> {
    enabled: bool,
    entries: RefCell<HashMap<usize, Option<(usize, T)>>>,
}

impl<T: Clone> MemoCache<T> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the cached outcome at `pos`, if any, else computes it with
    /// `f` and caches the result.
    pub fn get_or_insert_with(
        &self,
        pos: usize,
        f: impl FnOnce() -> Option<(usize, T)>,
    ) -> Option<(usize, T)> {
        if !self.enabled {
            return f();
        }
        if let Some(cached) = self.entries.borrow().get(&pos) {
            return cached.clone();
        }
        let result = f();
        self.entries.borrow_mut().insert(pos, result.clone());
        result
    }

    /// The cut operator: discards every entry at a position below
    /// `watermark`, bounding memory to the size of the longest un-cut span.
    pub fn purge_below(&self, watermark: usize) {
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|&pos, _| pos >= watermark);
        let purged = before - entries.len();
        if purged > 0 {
            log::trace!("memo: purged {purged} entries below watermark {watermark}");
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_both_success_and_failure() {
        let cache: MemoCache<u32> = MemoCache::new(true);
        let mut calls = 0;
        let mut run = |pos: usize, ok: bool| {
            cache.get_or_insert_with(pos, || {
                calls += 1;
                ok.then_some((pos + 1, 7))
            })
        };
        assert_eq!(run(0, true), Some((1, 7)));
        assert_eq!(run(0, true), Some((1, 7)));
        assert_eq!(run(1, false), None);
        assert_eq!(run(1, false), None);
        assert_eq!(calls, 2);
    }

    #[test]
    fn purge_below_drops_only_old_entries() {
        let cache: MemoCache<u32> = MemoCache::new(true);
        cache.get_or_insert_with(0, || Some((1, 1)));
        cache.get_or_insert_with(5, || Some((6, 1)));
        cache.purge_below(5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_never_retains_entries() {
        let cache: MemoCache<u32> = MemoCache::new(false);
        cache.get_or_insert_with(0, || Some((1, 1)));
        assert_eq!(cache.len(), 0);
    }
}
