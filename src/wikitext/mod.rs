//! The main grammar driver. Runs over the preprocessed text produced by
//! [`crate::preprocessor`] and builds the document AST ([`crate::ast`]).
//!
//! Unlike the preprocessor driver, most productions here genuinely depend
//! on the `no`/`ifnot`/`bol_skip`/`wspre` stacks (heading terminators, list
//! nesting, indent-pre, table lines), so this driver is built directly on
//! [`crate::engine::stacks::StackManager`] rather than threading an
//! immutable context value.

mod html;
mod inline;
mod links;
mod list;
mod postprocess;
mod table;

use std::cell::RefCell;

use crate::ast::{Block, HeadingLevel, Inline, TocKind};
use crate::config::Configuration;
use crate::diagnostics::Diagnostic;
use crate::engine::buffer::Buffer;
use crate::engine::stacks::StackManager;
use crate::span::Spanned;

pub use postprocess::postprocess;

/// The result of a full main-grammar parse.
pub struct ParseOutput {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) struct Parser<'a> {
    pub(crate) buffer: Buffer<'a>,
    pub(crate) stacks: StackManager,
    pub(crate) config: &'a Configuration,
    pub(crate) diagnostics: RefCell<Vec<Diagnostic>>,
}

/// Parses already-preprocessed text into a document, running the
/// post-processor (component H) over the result before returning.
pub fn parse(source: &str, config: &Configuration) -> ParseOutput {
    let p = Parser {
        buffer: Buffer::new(source),
        stacks: StackManager::new(),
        config,
        diagnostics: RefCell::new(Vec::new()),
    };
    let mut blocks = p.document();
    postprocess(&mut blocks);
    debug_assert!(p.stacks.is_balanced());
    log::debug!("parsed {} top-level blocks", blocks.len());
    ParseOutput {
        blocks,
        diagnostics: p.diagnostics.into_inner(),
    }
}

impl<'a> Parser<'a> {
    fn src(&self) -> &'a str {
        self.buffer.source()
    }

    /// `start`: a sequence of blocks to EOF. A run of empty lines followed
    /// by EOF (`empty_tail`) is dropped rather than producing paragraphs.
    fn document(&self) -> Vec<Block> {
        let mut out = Vec::new();
        let mut pos = 0;
        if let Some((next, redirect)) = self.redirect_block(pos) {
            out.push(redirect);
            pos = next;
        }
        while !self.buffer.is_eof(pos) {
            if self.is_empty_tail(pos) {
                break;
            }
            let blank_lines = self.count_blank_lines(pos);
            if blank_lines > 0 {
                let after_blanks = self.skip_blank_lines(pos);
                if self.is_empty_tail(after_blanks) {
                    break;
                }
                if blank_lines >= 2 {
                    out.push(Block::Paragraph {
                        inline: Vec::new(),
                        leading_br: false,
                        trailing_br: true,
                    });
                    pos = after_blanks;
                    continue;
                }
                let (next, mut block) = self.document_block(after_blanks);
                if let Block::Paragraph { leading_br, .. } = &mut block {
                    *leading_br = true;
                }
                out.push(block);
                pos = next;
                continue;
            }
            let (next, block) = self.document_block(pos);
            if next == pos {
                break;
            }
            out.push(block);
            pos = next;
        }
        out
    }

    /// A run of blank lines running to EOF: dropped (no trailing `<br/>`s
    /// for a document that just peters out).
    fn is_empty_tail(&self, pos: usize) -> bool {
        let rest = &self.src()[pos..];
        rest.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
    }

    /// How many consecutive whitespace-only lines start at `pos`. A single
    /// blank line attaches as a leading `<br/>` on the next paragraph; two
    /// or more become a `<br/>`-only paragraph of their own.
    fn count_blank_lines(&self, pos: usize) -> usize {
        let mut count = 0;
        let mut cur = pos;
        loop {
            let rest = &self.src()[cur..];
            let line_end = rest.find('\n').map_or(rest.len(), |n| n);
            if line_end < rest.len() && rest[..line_end].chars().all(|c| matches!(c, ' ' | '\t')) {
                count += 1;
                cur += line_end + 1;
            } else {
                break;
            }
        }
        count
    }

    fn skip_blank_lines(&self, pos: usize) -> usize {
        let mut cur = pos;
        loop {
            let rest = &self.src()[cur..];
            let line_end = rest.find('\n').map_or(rest.len(), |n| n);
            if line_end < rest.len() && rest[..line_end].chars().all(|c| matches!(c, ' ' | '\t')) {
                cur += line_end + 1;
            } else {
                break;
            }
        }
        cur
    }

    /// `#REDIRECT [[Target]]`, only valid at the very start of the document.
    fn redirect_block(&self, pos: usize) -> Option<(usize, Block)> {
        let word = self.config.redirect_word();
        let after_word = self.buffer.match_literal_ci(pos, word)?;
        let after_space = {
            let rest = &self.src()[after_word..];
            let trimmed = rest.trim_start_matches([' ', '\t']);
            after_word + (rest.len() - trimmed.len())
        };
        let (after_link, link) = links::internal_link(self, after_space)?;
        let after_line = {
            let rest = &self.src()[after_link..];
            let trimmed = rest.trim_start_matches([' ', '\t']);
            let mut end = after_link + (rest.len() - trimmed.len());
            if self.src()[end..].starts_with('\n') {
                end += 1;
            }
            end
        };
        Some((after_line, Block::Redirect { link: Box::new(link) }))
    }

    fn document_block(&self, pos: usize) -> (usize, Block) {
        if self.buffer.is_bol(pos) {
            if let Some(r) = self.block_at_bol(pos) {
                return r;
            }
        }
        if let Some(r) = html::block_element(self, pos) {
            return r;
        }
        self.paragraph(pos)
    }

    /// Blocks only recognized at beginning-of-line, tried in this order:
    /// heading, hr, table, list (after table, to disambiguate `::{|`), TOC
    /// marker, indent-pre.
    fn block_at_bol(&self, pos: usize) -> Option<(usize, Block)> {
        self.heading(pos)
            .or_else(|| self.horizontal_rule(pos))
            .or_else(|| table::table(self, pos))
            .or_else(|| list::list(self, pos))
            .or_else(|| self.toc_marker(pos))
            .or_else(|| self.indent_pre(pos))
    }

    /// `=`×N … `=`×N, N from 6 down to 1 (greedy), closed by `push_no_hN`.
    fn heading(&self, pos: usize) -> Option<(usize, Block)> {
        let bytes = self.src().as_bytes();
        let mut open_count = 0u8;
        while bytes.get(pos + open_count as usize) == Some(&b'=') && open_count < 6 {
            open_count += 1;
        }
        if open_count == 0 {
            return None;
        }
        for level in (1..=open_count).rev() {
            if let Some(r) = self.heading_at_level(pos, level) {
                return Some(r);
            }
        }
        None
    }

    fn heading_at_level(&self, pos: usize, level: u8) -> Option<(usize, Block)> {
        let after_open = pos + usize::from(level);
        let _no_h = self.stacks.push_no(crate::engine::traps::heading_terminator(level));
        let _no_nl = self.stacks.push_no(crate::engine::traps::newline());
        let (after_inline, inline) = inline::inline_run(self, after_open);
        drop(_no_h);
        drop(_no_nl);

        let bytes = self.src().as_bytes();
        let mut close_count = 0u8;
        let mut i = after_inline;
        while bytes.get(i) == Some(&b'=') {
            close_count += 1;
            i += 1;
        }
        if close_count < level {
            return None;
        }
        // `===x==` closes at level 2: logged as a mismatch rather than
        // failing the rule.
        let matched_level = level;
        if close_count != level {
            self.diagnostics.borrow_mut().push(Diagnostic::HeadingMismatch {
                opening: level,
                closing: close_count,
                span: crate::span::Span::new(pos, i),
            });
        }
        while bytes.get(i) == Some(&b' ') || bytes.get(i) == Some(&b'\t') {
            i += 1;
        }
        match bytes.get(i) {
            None => {}
            Some(b'\n') => i += 1,
            _ => return None,
        }
        // Consume subsequent empty lines (no trailing `<br/>`).
        loop {
            let line_start = i;
            let rest = &self.src()[i..];
            let trimmed_end = rest.find('\n').map_or(rest.len(), |n| n);
            if rest[..trimmed_end].chars().all(|c| matches!(c, ' ' | '\t')) && trimmed_end < rest.len() {
                i = line_start + trimmed_end + 1;
            } else {
                break;
            }
        }
        let level = HeadingLevel::try_from(matched_level).ok()?;
        Some((i, Block::Heading { level, inline }))
    }

    /// Four or more `-`, optional trailing blanks and newline.
    fn horizontal_rule(&self, pos: usize) -> Option<(usize, Block)> {
        let bytes = self.src().as_bytes();
        let mut i = pos;
        let mut count = 0u32;
        while bytes.get(i) == Some(&b'-') {
            count += 1;
            i += 1;
        }
        if count < 4 {
            return None;
        }
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        if bytes.get(i) == Some(&b'\n') {
            i += 1;
        }
        Some((i, Block::HorizontalRule))
    }

    /// Triggered by a beginning-of-line space when `wspre` is enabled. The
    /// first line must be non-blank; subsequent lines consume their leading
    /// space via `bol_skip`.
    fn indent_pre(&self, pos: usize) -> Option<(usize, Block)> {
        if !self.stacks.wspre_enabled() {
            return None;
        }
        if self.src().as_bytes().get(pos) != Some(&b' ') {
            return None;
        }
        let first_line_rest = {
            let rest = &self.src()[pos + 1..];
            let end = rest.find('\n').unwrap_or(rest.len());
            &rest[..end]
        };
        if first_line_rest.trim().is_empty() {
            return None;
        }
        let _bol_skip = self.stacks.push_bol_skip(crate::engine::traps::wspre_prefix());
        let mut all_inline = Vec::new();
        let mut pos = pos + 1;
        loop {
            let (next, mut line_inline) = inline::inline_run(self, pos);
            all_inline.append(&mut line_inline);
            pos = next;
            if self.src().as_bytes().get(pos) == Some(&b'\n')
                && self.src().as_bytes().get(pos + 1) == Some(&b' ')
                && !html::starts_block_element(self, pos + 2)
            {
                all_inline.push(Spanned::new(Inline::LineBreak, pos, pos + 1));
                pos += 2;
            } else {
                break;
            }
        }
        Some((pos, Block::IndentPre { inline: all_inline }))
    }

    /// `__TOC__`, `__NOTOC__`, `__FORCETOC__`, alone on a line (or at EOF),
    /// surrounded by blanks.
    fn toc_marker(&self, pos: usize) -> Option<(usize, Block)> {
        for (word, kind) in [
            ("__TOC__", TocKind::Toc),
            ("__NOTOC__", TocKind::NoToc),
            ("__FORCETOC__", TocKind::ForceToc),
        ] {
            if let Some(after) = self.buffer.match_literal(pos, word) {
                let rest = &self.src()[after..];
                let trimmed = rest.trim_start_matches([' ', '\t']);
                let end_of_blanks = after + (rest.len() - trimmed.len());
                let ends_line = trimmed.starts_with('\n') || trimmed.is_empty();
                if ends_line {
                    let end = if trimmed.starts_with('\n') {
                        end_of_blanks + 1
                    } else {
                        end_of_blanks
                    };
                    return Some((end, Block::TocMarker { kind }));
                }
            }
        }
        None
    }

    /// Catch-all: any run of inline content not otherwise claimed by a
    /// block production. A single preceding empty line attaches as a
    /// leading `<br/>`; two or more emit a separate `<br/>`-only paragraph
    /// (the caller threads this through `leading_br`/`trailing_br`).
    fn paragraph(&self, pos: usize) -> (usize, Block) {
        let (after, inline) = inline::inline_run(self, pos);
        let end = if self.src().as_bytes().get(after) == Some(&b'\n') {
            after + 1
        } else {
            after
        };
        (
            end,
            Block::Paragraph {
                inline,
                leading_br: false,
                trailing_br: false,
            },
        )
    }
}
