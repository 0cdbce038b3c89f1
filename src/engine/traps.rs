//! The semantic trap layer. Each function here builds the
//! [`crate::engine::stacks::StackPattern`] for one named trap and pushes it
//! through the [`crate::engine::stacks::StackManager`]; the returned guard is
//! the trap's implicit `pop_*` twin. `check_*` traps are plain reads and live
//! directly on `StackManager` since they need no pattern construction.

use std::rc::Rc;

use crate::engine::stacks::{literal_pattern, StackManager, StackPattern};

/// `push_no_hN`: a run of exactly `level` `=` characters, optionally
/// followed by blanks, then end-of-line or EOF.
pub fn heading_terminator(level: u8) -> StackPattern {
    Rc::new(move |source: &str, pos: usize| {
        let bytes = source.as_bytes();
        let mut i = pos;
        let mut count: u32 = 0;
        while bytes.get(i) == Some(&b'=') {
            count += 1;
            i += 1;
        }
        if count != u32::from(level) {
            return false;
        }
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        matches!(bytes.get(i), None | Some(b'\n'))
    })
}

/// `push_no_nl`: a single newline.
pub fn newline() -> StackPattern {
    Rc::new(|source: &str, pos: usize| source.as_bytes().get(pos) == Some(&b'\n'))
}

/// `push_ifnot_html_tag`: the close tag for a captured element name,
/// e.g. `</div>`, `</Div \t>`, matched case-insensitively with optional
/// interior whitespace before `>`.
pub fn close_tag(name: &str) -> StackPattern {
    let name = name.to_owned();
    Rc::new(move |source: &str, pos: usize| {
        let Some(rest) = source.get(pos..) else {
            return false;
        };
        let Some(after_slash) = rest.strip_prefix("</") else {
            return false;
        };
        let Some(after_name) = after_slash.get(..name.len()) else {
            return false;
        };
        if !after_name.eq_ignore_ascii_case(&name) {
            return false;
        }
        let tail = &after_slash[name.len()..];
        let trimmed = tail.trim_start_matches([' ', '\t']);
        trimmed.starts_with('>')
    })
}

/// `push_no_tableline`: `^[ \t]*[|!]`, only significant at beginning-of-line.
pub fn tableline() -> StackPattern {
    Rc::new(|source: &str, pos: usize| {
        let bol = pos == 0 || source.as_bytes().get(pos - 1) == Some(&b'\n');
        if !bol {
            return false;
        }
        let rest = &source[pos..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        trimmed.starts_with('|') || trimmed.starts_with('!')
    })
}

/// `push_bol_skip_ul` / `_ol` / `_dl`: the parent list marker character.
pub fn list_marker(marker: char) -> StackPattern {
    literal_pattern(marker.to_string())
}

/// `push_bol_skip_wspre`: the single-space prefix consumed inside
/// indent-pre.
pub fn wspre_prefix() -> StackPattern {
    literal_pattern(" ")
}

/// `push_ifnot_*`: a fixed closing delimiter (`]]`, `]`, `|`, `||`, `:`, …).
pub fn closer(delimiter: &str) -> StackPattern {
    literal_pattern(delimiter)
}

/// Convenience wrapper bundling the four `push_*` traps that take no
/// argument beyond the manager.
pub struct Traps;

impl Traps {
    pub fn push_no_h(stacks: &StackManager, level: u8) -> impl Drop + '_ {
        stacks.push_no(heading_terminator(level))
    }

    pub fn push_no_nl(stacks: &StackManager) -> impl Drop + '_ {
        stacks.push_no(newline())
    }

    pub fn push_no_tableline(stacks: &StackManager) -> impl Drop + '_ {
        stacks.push_no(tableline())
    }

    pub fn push_ifnot(stacks: &StackManager, delimiter: &str) -> impl Drop + '_ {
        stacks.push_ifnot(closer(delimiter))
    }

    pub fn push_ifnot_html_tag(stacks: &StackManager, name: &str) -> impl Drop + '_ {
        stacks.push_ifnot(close_tag(name))
    }

    pub fn push_bol_skip_marker(stacks: &StackManager, marker: char) -> impl Drop + '_ {
        stacks.push_bol_skip(list_marker(marker))
    }

    pub fn push_bol_skip_wspre(stacks: &StackManager) -> impl Drop + '_ {
        stacks.push_bol_skip(wspre_prefix())
    }

    pub fn push_wspre_off(stacks: &StackManager) -> impl Drop + '_ {
        stacks.push_wspre(false)
    }

    pub fn push_wspre_on(stacks: &StackManager) -> impl Drop + '_ {
        stacks.push_wspre(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_terminator_requires_exact_count() {
        let pat = heading_terminator(2);
        assert!(pat("== \n", 0));
        assert!(!pat("=== \n", 0));
        assert!(!pat("= \n", 0));
    }

    #[test]
    fn close_tag_is_case_insensitive_with_whitespace() {
        let pat = close_tag("div");
        assert!(pat("</DIV \t>", 0));
        assert!(!pat("</divx>", 0));
    }
}
