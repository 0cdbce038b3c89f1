//! Component D: the PEG combinator evaluator. A rule is any
//! `Fn(usize) -> PResult<T>` closure; these free functions and macros
//! interpret the ordinary PEG operators (ordered choice, sequence, optional,
//! repetition, lookahead) over such closures. Terminal matches (literals,
//! anchored regexes) live on [`crate::engine::buffer::Buffer`]; cut lives on
//! [`crate::engine::memo::MemoCache`]; semantic traps live in
//! [`crate::engine::traps`]. Evaluation is left-to-right with unlimited
//! lookahead: a failing step simply returns `None` and consumes nothing,
//! since every combinator here is a pure function of `pos`.

/// The result of attempting a rule at a position: `None` for failure,
/// `Some((end, value))` for success.
pub type PResult<T> = Option<(usize, T)>;

/// Optional (`?`): always succeeds, with `None` if the inner rule fails.
pub fn opt<T>(rule: impl FnOnce(usize) -> PResult<T>, pos: usize) -> PResult<Option<T>> {
    match rule(pos) {
        Some((end, v)) => Some((end, Some(v))),
        None => Some((pos, None)),
    }
}

/// Zero-or-more (`*`). Stops (without failing) if an iteration would not
/// advance the position, so a rule that can match empty never loops forever.
pub fn star<T>(mut rule: impl FnMut(usize) -> PResult<T>, pos: usize) -> PResult<Vec<T>> {
    let mut out = Vec::new();
    let mut cur = pos;
    while let Some((end, v)) = rule(cur) {
        if end == cur {
            break;
        }
        out.push(v);
        cur = end;
    }
    Some((cur, out))
}

/// One-or-more (`+`).
pub fn plus<T>(mut rule: impl FnMut(usize) -> PResult<T>, pos: usize) -> PResult<Vec<T>> {
    let (end, out) = star(&mut rule, pos)?;
    if out.is_empty() { None } else { Some((end, out)) }
}

/// Positive lookahead (`&`): succeeds without consuming input if the rule
/// would match.
pub fn and_lookahead<T>(rule: impl FnOnce(usize) -> PResult<T>, pos: usize) -> PResult<()> {
    rule(pos).map(|_| (pos, ()))
}

/// Negative lookahead (`!`): succeeds without consuming input if the rule
/// would NOT match.
pub fn not_lookahead<T>(rule: impl FnOnce(usize) -> PResult<T>, pos: usize) -> PResult<()> {
    match rule(pos) {
        Some(_) => None,
        None => Some((pos, ())),
    }
}

/// Repeats `rule` exactly `n` times, failing if any iteration fails.
pub fn repeat_exact<T>(mut rule: impl FnMut(usize) -> PResult<T>, pos: usize, n: usize) -> PResult<Vec<T>> {
    let mut out = Vec::with_capacity(n);
    let mut cur = pos;
    for _ in 0..n {
        let (end, v) = rule(cur)?;
        out.push(v);
        cur = end;
    }
    Some((cur, out))
}

/// Ordered choice (first matching alternative wins). Each arm is a closure
/// of `FnOnce(usize) -> PResult<T>` evaluated at the same starting position.
#[macro_export]
macro_rules! choice {
    ($pos:expr, $($rule:expr),+ $(,)?) => {{
        let __pos = $pos;
        loop {
            $(
                if let Some(result) = ($rule)(__pos) {
                    break Some(result);
                }
            )+
            break None;
        }
    }};
}

/// Sequencing: each named step only runs if the previous succeeded, threading
/// the position forward. On failure of any step, the whole sequence fails
/// and no partial side effect from the macro itself remains (any stack
/// pushes performed by a step's own rule are unwound by that rule's guard's
/// `Drop`, per [`crate::engine::stacks`]).
#[macro_export]
macro_rules! seq {
    ($pos:expr, $($name:ident = $rule:expr),+ $(,)? => $body:expr) => {{
        (|| -> Option<(usize, _)> {
            let mut __pos = $pos;
            $(
                let (__next, $name) = ($rule)(__pos)?;
                __pos = __next;
            )+
            Some((__pos, $body))
        })()
    }};
}

pub use crate::{choice, seq};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_loop_on_empty_match() {
        let rule = |pos: usize| -> PResult<()> { Some((pos, ())) };
        let (end, items) = star(rule, 3).unwrap();
        assert_eq!(end, 3);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn plus_requires_at_least_one() {
        let rule = |_pos: usize| -> PResult<()> { None };
        assert_eq!(plus(rule, 0), None);
    }

    #[test]
    fn choice_tries_in_order() {
        let a = |_pos: usize| -> PResult<&'static str> { None };
        let b = |pos: usize| -> PResult<&'static str> { Some((pos + 1, "b")) };
        let result = choice!(0, a, b);
        assert_eq!(result, Some((1, "b")));
    }

    #[test]
    fn seq_threads_position() {
        let lit_a = |pos: usize| -> PResult<()> { Some((pos + 1, ())) };
        let lit_b = |pos: usize| -> PResult<()> { Some((pos + 1, ())) };
        let result = seq!(0, _a = lit_a, _b = lit_b => "ab");
        assert_eq!(result, Some((2, "ab")));
    }
}
