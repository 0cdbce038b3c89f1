//! The state-stack manager. Four named LIFO stacks (`no`, `ifnot`,
//! `bol_skip`, `wspre`) whose tops gate the matching of other rules.
//!
//! A macro-generated PEG grammar gets rollback-on-backtrack for free:
//! nothing actually runs on failure, since the whole rule closure
//! re-executes from scratch on retry. A hand-rolled engine does not get
//! that for free, so here every `push_*` returns a guard — built with
//! `scopeguard` — that pops the stack when dropped. Whether the calling
//! rule returns `Some` or `None`, or is itself unwound by an early `?`, the
//! guard's `Drop` fires exactly once, guaranteeing every push is matched by
//! exactly one pop on every exit path.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;
use scopeguard::ScopeGuard;

/// A compiled pattern pushed onto `no`, `ifnot`, or `bol_skip`. Stored as a
/// closure rather than a string so fixed-form patterns can be precompiled
/// once at grammar-load time.
pub type StackPattern = Rc<dyn Fn(&str, usize) -> bool>;

/// Wraps a precompiled [`Regex`] as a [`StackPattern`], anchored at `pos`.
pub fn regex_pattern(re: Regex) -> StackPattern {
    Rc::new(move |source: &str, pos: usize| {
        source
            .get(pos..)
            .and_then(|rest| re.find(rest))
            .is_some_and(|m| m.start() == 0)
    })
}

/// Wraps a literal string as a [`StackPattern`].
pub fn literal_pattern(literal: impl Into<String>) -> StackPattern {
    let literal = literal.into();
    Rc::new(move |source: &str, pos: usize| {
        source.get(pos..).is_some_and(|rest| rest.starts_with(&literal))
    })
}

type PopGuard<'a> = ScopeGuard<&'a RefCell<Vec<StackPattern>>, fn(&'a RefCell<Vec<StackPattern>>)>;

fn pop_on_drop(stack: &RefCell<Vec<StackPattern>>) {
    stack.borrow_mut().pop();
}

#[derive(Default)]
pub struct StackManager {
    no: RefCell<Vec<StackPattern>>,
    ifnot: RefCell<Vec<StackPattern>>,
    bol_skip: RefCell<Vec<StackPattern>>,
    /// `true` means indent-pre recognition is enabled.
    wspre: RefCell<Vec<bool>>,
}

impl StackManager {
    pub fn new() -> Self {
        Self {
            no: RefCell::new(Vec::new()),
            ifnot: RefCell::new(Vec::new()),
            bol_skip: RefCell::new(Vec::new()),
            wspre: RefCell::new(vec![true]),
        }
    }

    pub fn push_no(&self, pattern: StackPattern) -> PopGuard<'_> {
        self.no.borrow_mut().push(pattern);
        scopeguard::guard(&self.no, pop_on_drop)
    }

    pub fn push_ifnot(&self, pattern: StackPattern) -> PopGuard<'_> {
        self.ifnot.borrow_mut().push(pattern);
        scopeguard::guard(&self.ifnot, pop_on_drop)
    }

    pub fn push_bol_skip(&self, pattern: StackPattern) -> PopGuard<'_> {
        self.bol_skip.borrow_mut().push(pattern);
        scopeguard::guard(&self.bol_skip, pop_on_drop)
    }

    /// Pushes a new `wspre` toggle frame. `pop_wspre`'s RAII equivalent.
    pub fn push_wspre(&self, on: bool) -> impl Drop + '_ {
        self.wspre.borrow_mut().push(on);
        scopeguard::guard(&self.wspre, |stack: &RefCell<Vec<bool>>| {
            stack.borrow_mut().pop();
        })
    }

    pub fn wspre_enabled(&self) -> bool {
        self.wspre.borrow().last().copied().unwrap_or(true)
    }

    /// Fails (returns `false`) if any `no` pattern matches at `pos` — the
    /// `check_no` trap.
    pub fn check_no(&self, source: &str, pos: usize) -> bool {
        !self.no.borrow().iter().any(|p| p(source, pos))
    }

    /// Fails if any `ifnot` pattern matches at `pos` — the `check_ifnot`
    /// trap.
    pub fn check_ifnot(&self, source: &str, pos: usize) -> bool {
        !self.ifnot.borrow().iter().any(|p| p(source, pos))
    }

    /// `check_ifnot` followed by `check_no`; used before every generic
    /// character consumption in inline contexts.
    pub fn check_ifnots(&self, source: &str, pos: usize) -> bool {
        self.check_ifnot(source, pos) && self.check_no(source, pos)
    }

    /// Consumes, in order, every pattern on `bol_skip` from bottom to top;
    /// fails (returns `None`) if any entry does not match. This is the
    /// `check_bol_skip` trap, which is read-only with respect to the stack
    /// itself (it does not push or pop).
    pub fn check_bol_skip(&self, source: &str, pos: usize) -> Option<usize> {
        let mut cur = pos;
        for pattern in self.bol_skip.borrow().iter() {
            if !pattern(source, cur) {
                return None;
            }
            // bol_skip patterns are single-character-class prefixes; the
            // caller re-derives the exact width via the pattern's own match,
            // so advancing by one byte-run here is wrong for multi-byte
            // prefixes. Patterns built by `traps::*` all match exactly the
            // marker byte, so advancing one byte is correct for this engine.
            cur += 1;
        }
        Some(cur)
    }

    pub fn is_balanced(&self) -> bool {
        self.no.borrow().is_empty()
            && self.ifnot.borrow().is_empty()
            && self.bol_skip.borrow().is_empty()
            && self.wspre.borrow().len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_guard_pops_on_drop_even_on_early_return() {
        let stacks = StackManager::new();
        fn trial(stacks: &StackManager) -> Option<()> {
            let _guard = stacks.push_no(literal_pattern("x"));
            None
        }
        trial(&stacks);
        assert!(stacks.is_balanced());
    }

    #[test]
    fn check_no_sees_pushed_pattern() {
        let stacks = StackManager::new();
        assert!(stacks.check_no("abc", 0));
        let _guard = stacks.push_no(literal_pattern("a"));
        assert!(!stacks.check_no("abc", 0));
        assert!(stacks.check_no("abc", 1));
    }
}
