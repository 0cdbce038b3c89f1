//! The preprocessor grammar driver. Recognizes template transclusion-
//! relevant structure without evaluating it: templates, arguments, links
//! (balanced, permitting nested templates), comments (including the
//! "comment-alone" whitespace-absorption quirk), and the
//! `noinclude`/`includeonly`/`onlyinclude` inclusion-control tags.
//!
//! None of these productions read the `no`/`ifnot`/`bol_skip`/`wspre`
//! stacks — those are a main-grammar concept (headings, list markers, table
//! lines, indent-pre) — so this driver threads its narrower per-call state
//! (the closing delimiter an argument or link body should stop at) through
//! an immutable [`StopAt`] value instead of mutable stacks.

use std::cell::{Cell, RefCell};

use crate::config::Configuration;
use crate::diagnostics::Diagnostic;
use crate::engine::buffer::Buffer;
use crate::engine::memo::MemoCache;
use crate::span::{Span, Spanned};

/// A node of the preprocessor's token tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PreToken {
    /// A verbatim run; the text itself lives in the node's [`Span`].
    Text,
    Template {
        name: Vec<Spanned<PreToken>>,
        args: Vec<TemplateArg>,
        at_bol: bool,
    },
    Argument {
        name: Vec<Spanned<PreToken>>,
        defaults: Vec<Vec<Spanned<PreToken>>>,
    },
    Link {
        content: Vec<Spanned<PreToken>>,
    },
    Comment {
        alone: bool,
    },
    Noinclude {
        content: Vec<Spanned<PreToken>>,
        closed: bool,
    },
    Includeonly {
        content: Vec<Spanned<PreToken>>,
        closed: bool,
    },
    Onlyinclude {
        content: Vec<Spanned<PreToken>>,
        closed: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Positional(Vec<Spanned<PreToken>>),
    Named {
        name: Vec<Spanned<PreToken>>,
        value: Vec<Spanned<PreToken>>,
    },
}

/// What a nested content run should treat as its closing delimiter(s),
/// threaded through by value rather than a mutable stack.
#[derive(Clone, Copy, Debug, Default)]
struct StopAt {
    pipe: bool,
    close_brace2: bool,
    close_brace3: bool,
    close_bracket2: bool,
}

pub struct Preprocessor<'a> {
    buffer: Buffer<'a>,
    #[allow(dead_code)]
    config: &'a Configuration,
    template_memo: MemoCache<Spanned<PreToken>>,
    argument_memo: MemoCache<Spanned<PreToken>>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    saw_onlyinclude: Cell<bool>,
}

pub struct PreprocessResult {
    pub tree: Vec<Spanned<PreToken>>,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn preprocess(source: &str, config: &Configuration) -> PreprocessResult {
    let p = Preprocessor {
        buffer: Buffer::new(source),
        config,
        template_memo: MemoCache::new(config.memoization),
        argument_memo: MemoCache::new(config.memoization),
        diagnostics: RefCell::new(Vec::new()),
        saw_onlyinclude: Cell::new(false),
    };
    let tree = p.document();
    let saw_onlyinclude = p.saw_onlyinclude.get();
    let text = render(source, &tree, saw_onlyinclude);
    PreprocessResult {
        tree,
        text,
        diagnostics: p.diagnostics.into_inner(),
    }
}

impl<'a> Preprocessor<'a> {
    fn src(&self) -> &'a str {
        self.buffer.source()
    }

    /// The top-level driver: `element >>` with a cut after every element to
    /// bound memo growth.
    fn document(&self) -> Vec<Spanned<PreToken>> {
        let mut out = Vec::new();
        let mut pos = 0;
        while !self.buffer.is_eof(pos) {
            let (next, tok) = self.element(pos, StopAt::default());
            out.push(tok);
            self.template_memo.purge_below(pos);
            self.argument_memo.purge_below(pos);
            pos = next;
        }
        out
    }

    /// Parses a run of elements until `stop` signals a terminator is next,
    /// or EOF.
    fn run_until(&self, pos: usize, stop: StopAt) -> (usize, Vec<Spanned<PreToken>>) {
        let mut out = Vec::new();
        let mut cur = pos;
        while !self.buffer.is_eof(cur) && !self.at_stop(cur, stop) {
            let (next, tok) = self.element(cur, stop);
            if next == cur {
                break;
            }
            out.push(tok);
            cur = next;
        }
        (cur, out)
    }

    fn at_stop(&self, pos: usize, stop: StopAt) -> bool {
        let src = self.src();
        (stop.pipe && self.buffer.match_literal(pos, "|").is_some())
            || (stop.close_brace2 && self.buffer.match_literal(pos, "}}").is_some())
            || (stop.close_brace3 && self.buffer.match_literal(pos, "}}}").is_some())
            || (stop.close_bracket2 && self.buffer.match_literal(pos, "]]").is_some())
            || src.is_empty()
    }

    /// One preprocessor element: the ordered choice tried at every position.
    fn element(&self, pos: usize, stop: StopAt) -> (usize, Spanned<PreToken>) {
        if let Some(r) = self.comment(pos) {
            return r;
        }
        if let Some(r) = self.inclusion_region(pos) {
            return r;
        }
        if let Some(r) = self.ignore_tag(pos) {
            return r;
        }
        if let Some(r) = self.template(pos) {
            return r;
        }
        if let Some(r) = self.argument(pos) {
            return r;
        }
        if let Some(r) = self.link(pos) {
            return r;
        }
        if let Some(r) = self.text_run(pos, stop) {
            return r;
        }
        // Fallthrough: any single character.
        let width = self.src()[pos..].chars().next().map_or(1, char::len_utf8);
        (pos + width, Spanned::new(PreToken::Text, pos, pos + width))
    }

    /// A run of characters excluding the structural punctuation this grammar
    /// dispatches on, and the active `stop` delimiters.
    fn text_run(&self, pos: usize, stop: StopAt) -> Option<(usize, Spanned<PreToken>)> {
        let mut cur = pos;
        loop {
            if self.buffer.is_eof(cur) || self.at_stop(cur, stop) {
                break;
            }
            let c = self.buffer.at(cur)?;
            if matches!(c, '\n' | '{' | '}' | '|' | '=' | '[' | ']' | '<') {
                break;
            }
            cur += c.len_utf8();
        }
        if cur == pos {
            None
        } else {
            Some((cur, Spanned::new(PreToken::Text, pos, cur)))
        }
    }

    /// `<!-- … -->`, with the comment-alone whitespace-absorption quirk.
    /// Not treated as alone if it is on the document's literal first line
    /// (i.e. nothing at all precedes the run of blanks before it), even if
    /// the rest of the pattern matches.
    fn comment(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        self.buffer.match_literal(pos, "<!--")?;
        let src = self.src();
        let close = src[pos..].find("-->");
        let (end, closed) = match close {
            Some(offset) => (pos + offset + 3, true),
            None => (src.len(), false),
        };
        if !closed {
            self.diagnostics.borrow_mut().push(Diagnostic::UnclosedComment {
                span: Span::new(pos, end),
            });
            return Some((end, Spanned::new(PreToken::Comment { alone: false }, pos, end)));
        }

        let before_blanks_end = src[..pos].trim_end_matches([' ', '\t']).len();
        let preceded_by_newline_not_bof =
            before_blanks_end > 0 && src.as_bytes()[before_blanks_end - 1] == b'\n';

        let mut alone_end = end;
        let mut alone = false;
        if preceded_by_newline_not_bof {
            let after = &src[end..];
            let trimmed = after.trim_start_matches([' ', '\t']);
            let consumed_blanks = after.len() - trimmed.len();
            if trimmed.starts_with('\n') {
                alone_end = end + consumed_blanks + 1;
                alone = true;
            } else if trimmed.is_empty() {
                alone_end = end + consumed_blanks;
                alone = true;
            }
        }

        Some((
            alone_end,
            Spanned::new(PreToken::Comment { alone }, pos, end),
        ))
    }

    /// `noinclude`, `includeonly`, `onlyinclude` regions. The closing tag may
    /// be absent, in which case EOF closes the region.
    fn inclusion_region(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        for (tag, ctor) in [
            ("noinclude", PreToken::Noinclude as fn(_, _) -> _),
            ("includeonly", PreToken::Includeonly as fn(_, _) -> _),
            ("onlyinclude", PreToken::Onlyinclude as fn(_, _) -> _),
        ] {
            let open = format!("<{tag}>");
            if let Some(after_open) = self.buffer.match_literal(pos, &open) {
                if tag == "onlyinclude" {
                    self.saw_onlyinclude.set(true);
                }
                let close = format!("</{tag}>");
                let (content_end, closed) = match self.src()[after_open..].find(&close) {
                    Some(offset) => (after_open + offset, true),
                    None => (self.src().len(), false),
                };
                let (_, content) = self.run_until_pos(after_open, content_end);
                let end = if closed {
                    content_end + close.len()
                } else {
                    content_end
                };
                if !closed {
                    self.diagnostics.borrow_mut().push(Diagnostic::UnclosedInclusion {
                        tag: match tag {
                            "noinclude" => "noinclude",
                            "includeonly" => "includeonly",
                            _ => "onlyinclude",
                        },
                        span: Span::new(pos, end),
                    });
                }
                return Some((end, Spanned::new(ctor(content, closed), pos, end)));
            }
        }
        None
    }

    /// Parses elements up to (but not past) an absolute byte position —
    /// used by inclusion regions, whose closing tag was already located.
    fn run_until_pos(&self, pos: usize, limit: usize) -> (usize, Vec<Spanned<PreToken>>) {
        let mut out = Vec::new();
        let mut cur = pos;
        while cur < limit {
            let (next, tok) = self.element(cur, StopAt::default());
            if next > limit || next == cur {
                break;
            }
            out.push(tok);
            cur = next;
        }
        (cur, out)
    }

    /// A dangling close tag for any inclusion region: consumed and discarded.
    fn ignore_tag(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        for tag in ["noinclude", "includeonly", "onlyinclude"] {
            let close = format!("</{tag}>");
            if let Some(end) = self.buffer.match_literal(pos, &close) {
                return Some((end, Spanned::new(PreToken::Text, pos, pos)));
            }
        }
        None
    }

    /// `{{ name ( | arg )* }}`, permitting recursion. Context-independent,
    /// so it is safe to memoize purely by start position.
    fn template(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        self.template_memo
            .get_or_insert_with(pos, || self.template_uncached(pos))
    }

    fn template_uncached(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        let after_open = self.buffer.match_literal(pos, "{{")?;
        // Disambiguate from `{{{argument}}}`: only treat as a template if
        // this is not immediately also an argument open.
        if self.buffer.match_literal(after_open, "{").is_some()
            && self.argument_uncached(pos).is_some()
        {
            return None;
        }
        let at_bol = self.buffer.is_bol(pos);
        let name_stop = StopAt {
            pipe: true,
            close_brace2: true,
            ..StopAt::default()
        };
        let (after_name, name) = self.run_until(after_open, name_stop);
        let mut args = Vec::new();
        let mut cur = after_name;
        while self.buffer.match_literal(cur, "|").is_some() {
            let (after_pipe, _) = (cur + 1, ());
            let arg_stop = StopAt {
                pipe: true,
                close_brace2: true,
                ..StopAt::default()
            };
            let (after_eq_probe, name_part) = self.run_until(
                after_pipe,
                StopAt {
                    pipe: true,
                    close_brace2: true,
                    ..arg_stop
                },
            );
            if self.buffer.match_literal(after_eq_probe, "=").is_some()
                && !matches!(name_part.as_slice(), [])
                && self.looks_like_bare_name(&name_part)
            {
                let (after_value, value) = self.run_until(after_eq_probe + 1, arg_stop);
                args.push(TemplateArg::Named {
                    name: name_part,
                    value,
                });
                cur = after_value;
            } else {
                args.push(TemplateArg::Positional(name_part));
                cur = after_eq_probe;
            }
        }
        let end = self.buffer.match_literal(cur, "}}")?;
        Some((
            end,
            Spanned::new(PreToken::Template { name, args, at_bol }, pos, end),
        ))
    }

    /// Whether a parsed argument-name run is plausibly a bare identifier
    /// (no nested structural tokens), so `name=value` is treated as named
    /// rather than a positional value that happens to contain `=`.
    fn looks_like_bare_name(&self, tokens: &[Spanned<PreToken>]) -> bool {
        tokens
            .iter()
            .all(|t| matches!(t.node, PreToken::Text))
    }

    /// `{{{ name ( | default )* }}}`.
    fn argument(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        self.argument_memo
            .get_or_insert_with(pos, || self.argument_uncached(pos))
    }

    fn argument_uncached(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        let after_open = self.buffer.match_literal(pos, "{{{")?;
        let stop = StopAt {
            pipe: true,
            close_brace3: true,
            ..StopAt::default()
        };
        let (after_name, name) = self.run_until(after_open, stop);
        let mut defaults = Vec::new();
        let mut cur = after_name;
        while self.buffer.match_literal(cur, "|").is_some() {
            let (after_default, default) = self.run_until(cur + 1, stop);
            defaults.push(default);
            cur = after_default;
        }
        let end = self.buffer.match_literal(cur, "}}}")?;
        Some((
            end,
            Spanned::new(PreToken::Argument { name, defaults }, pos, end),
        ))
    }

    /// `[[ … ]]`, balanced, where nested templates are recognized and `|` is
    /// ordinary (not a stop delimiter inside the link body).
    fn link(&self, pos: usize) -> Option<(usize, Spanned<PreToken>)> {
        let after_open = self.buffer.match_literal(pos, "[[")?;
        let stop = StopAt {
            close_bracket2: true,
            ..StopAt::default()
        };
        let (after_content, content) = self.run_until_link(after_open, stop);
        let end = self.buffer.match_literal(after_content, "]]")?;
        Some((end, Spanned::new(PreToken::Link { content }, pos, end)))
    }

    fn run_until_link(&self, pos: usize, stop: StopAt) -> (usize, Vec<Spanned<PreToken>>) {
        let mut out = Vec::new();
        let mut cur = pos;
        while !self.buffer.is_eof(cur) && !self.at_stop(cur, stop) {
            let attempt = self
                .comment(cur)
                .or_else(|| self.template_uncached(cur))
                .or_else(|| self.argument_uncached(cur))
                .or_else(|| self.text_run(cur, stop));
            let (next, tok) = match attempt {
                Some(r) => r,
                None => {
                    let width = self.src()[cur..].chars().next().map_or(1, char::len_utf8);
                    (cur + width, Spanned::new(PreToken::Text, cur, cur + width))
                }
            };
            if next == cur {
                break;
            }
            out.push(tok);
            cur = next;
        }
        (cur, out)
    }
}

/// Reconstructs the preprocessed text the main grammar parses: comments are
/// dropped (the alone trailing newline+blanks already excluded from spans by
/// `comment`; the alone *leading* blanks are trimmed from the already-emitted
/// output here), inclusion-control tags are stripped, `includeonly` content
/// is dropped (this parser has no transclusion mode, so it always renders in
/// direct-view mode), and templates/arguments are passed through verbatim
/// since they are not evaluated.
fn render(source: &str, tree: &[Spanned<PreToken>], _saw_onlyinclude: bool) -> String {
    let mut out = String::with_capacity(source.len());
    render_into(source, tree, &mut out);
    out
}

fn render_into(source: &str, tree: &[Spanned<PreToken>], out: &mut String) {
    for t in tree {
        match &t.node {
            PreToken::Text => out.push_str(&source[t.span.into_range()]),
            PreToken::Comment { alone } => {
                if *alone {
                    while out.ends_with(' ') || out.ends_with('\t') {
                        out.pop();
                    }
                }
            }
            PreToken::Template { .. } | PreToken::Argument { .. } => {
                out.push_str(&source[t.span.into_range()]);
            }
            PreToken::Link { content } => {
                out.push_str("[[");
                render_into(source, content, out);
                out.push_str("]]");
            }
            PreToken::Noinclude { content, .. } | PreToken::Onlyinclude { content, .. } => {
                render_into(source, content, out);
            }
            PreToken::Includeonly { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Configuration {
        Configuration::default()
    }

    #[test]
    fn template_with_positional_and_named_args() {
        let config = config();
        let result = preprocess("{{t|a|k=v}}", &config);
        assert_eq!(result.tree.len(), 1);
        match &result.tree[0].node {
            PreToken::Template { name, args, .. } => {
                assert_eq!(name.len(), 1);
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], TemplateArg::Positional(_)));
                assert!(matches!(args[1], TemplateArg::Named { .. }));
            }
            other => panic!("expected Template, got {other:?}"),
        }
    }

    #[test]
    fn comment_alone_swallows_one_newline() {
        let config = config();
        let result = preprocess("x\n<!-- c -->\ny", &config);
        assert_eq!(result.text, "x\ny");
    }

    #[test]
    fn first_line_comment_is_never_alone() {
        let config = config();
        let result = preprocess("<!-- c -->\ny", &config);
        assert_eq!(result.text, "\ny");
        match &result.tree[0].node {
            PreToken::Comment { alone } => assert!(!alone),
            other => panic!("expected Comment, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_comment_runs_to_eof() {
        let config = config();
        let result = preprocess("a<!-- nope", &config);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            result.diagnostics[0],
            Diagnostic::UnclosedComment { .. }
        ));
    }

    #[test]
    fn includeonly_is_dropped_in_direct_view_mode() {
        let config = config();
        let result = preprocess("a<includeonly>b</includeonly>c", &config);
        assert_eq!(result.text, "ac");
    }

    #[test]
    fn noinclude_content_is_kept_in_direct_view_mode() {
        let config = config();
        let result = preprocess("a<noinclude>b</noinclude>c", &config);
        assert_eq!(result.text, "abc");
    }
}
