//! Tables: `{| attrs … |}`, with an optional `|+` caption and `|-`-separated
//! rows of `|`/`!` cells. A cell with a same-line separator following it
//! gets bounded inline content; the terminal cell on a line (and the
//! caption, which has no separator of its own) is parsed as a nested block
//! document instead, so it can hold a nested list, table, or heading. The
//! post-processor's flattening pass collapses the common single-paragraph
//! case back down to plain inline content.

use crate::ast::{Attribute, Block, CellContent, TableCell, TableCellKind, TableRow};
use crate::wikitext::{html, inline, Parser};

/// Handles the `::{| … |}` indented-table idiom: a run of `:` before `{|`
/// is preserved as that many levels of `Dl` list nesting around the table,
/// rather than being swallowed by [`crate::wikitext::list::list`] as an
/// empty-content definition list (hence dispatch tries `table` before
/// `list`).
pub(crate) fn table(p: &Parser, pos: usize) -> Option<(usize, Block)> {
    if !p.buffer.is_bol(pos) {
        return None;
    }
    let bytes = p.src().as_bytes();
    let mut indent = 0usize;
    while bytes.get(pos + indent) == Some(&b':') {
        indent += 1;
    }
    if !p.src()[pos + indent..].starts_with("{|") {
        return None;
    }
    let (end, body) = table_body(p, pos + indent)?;
    let mut block = body;
    for _ in 0..indent {
        block = Block::List {
            kind: crate::ast::ListKind::Dl,
            items: vec![crate::ast::ListItem { content: Vec::new(), sublists: vec![block] }],
        };
    }
    Some((end, block))
}

fn table_body(p: &Parser, pos: usize) -> Option<(usize, Block)> {
    let after_open = p.buffer.match_literal(pos, "{|")?;
    let (after_attrs, attrs) = line_attrs(p, after_open);
    let mut cur = consume_to_next_line(p, after_attrs);

    let mut caption = None;
    if p.buffer.match_literal(cur, "|+").is_some() {
        let content_start = cur + 2;
        let (after, blocks) = cell_content_document(p, content_start);
        caption = Some(CellContent::Blocks(blocks));
        cur = after;
    }

    let mut rows = Vec::new();
    let mut first_row = true;
    loop {
        if p.buffer.match_literal(cur, "|}").is_some() {
            cur += 2;
            break;
        }
        if p.buffer.is_eof(cur) {
            break;
        }
        let (row_attrs, after_dash) = if p.buffer.match_literal(cur, "|-").is_some() {
            let (after_attrs, attrs) = line_attrs(p, cur + 2);
            (attrs, consume_to_next_line(p, after_attrs))
        } else if first_row {
            (Vec::new(), cur)
        } else {
            break;
        };
        first_row = false;
        let (after, cells) = table_cells(p, after_dash);
        rows.push(TableRow { attrs: row_attrs, cells });
        cur = after;
    }

    Some((
        cur,
        Block::Table {
            attrs,
            caption,
            rows,
        },
    ))
}

/// Reads the remaining line as `name=value` attribute pairs (table-start or
/// row-start lines carry attributes this way, with no closing `>`).
fn line_attrs(p: &Parser, pos: usize) -> (usize, Vec<Attribute>) {
    let src = p.src();
    let line_end = p.buffer.line_end(pos);
    let mut cur = html::skip_ws(src, pos);
    let mut attrs = Vec::new();
    while cur < line_end {
        match html::parse_attribute(src, cur) {
            Some((next, attr)) if next <= line_end => {
                attrs.push(attr);
                cur = html::skip_ws(src, next);
            }
            _ => break,
        }
    }
    (cur, attrs)
}

fn consume_to_next_line(p: &Parser, pos: usize) -> usize {
    let src = p.src();
    match src[pos..].find('\n') {
        Some(n) => pos + n + 1,
        None => src.len(),
    }
}

fn table_cells(p: &Parser, pos: usize) -> (usize, Vec<TableCell>) {
    let mut cells = Vec::new();
    let mut cur = pos;
    loop {
        let kind = match p.src().as_bytes().get(cur) {
            Some(b'|') if p.src()[cur..].starts_with("|-") || p.src()[cur..].starts_with("|}") => break,
            Some(b'|') => TableCellKind::Data,
            Some(b'!') => TableCellKind::Header,
            _ => break,
        };
        let sep = if kind == TableCellKind::Header { "!!" } else { "||" };
        let alt_sep = if kind == TableCellKind::Header { Some("||") } else { None };
        let after_marker = cur + 1;
        let (cell_end, attrs, content_start, has_same_line_sep) = cell_bounds(p, after_marker, sep, alt_sep);
        let (after_content, content) = if has_same_line_sep {
            let (after, inline) = cell_content_bounded(p, content_start, cell_end);
            (after, CellContent::Inline(inline))
        } else {
            // The terminal cell on a line: no further separator follows it,
            // so its content may run across lines and hold block markup of
            // its own (a nested list, table, or heading), not just inline.
            let (after, blocks) = cell_content_document(p, content_start);
            (after, CellContent::Blocks(blocks))
        };
        cells.push(TableCell { kind, attrs, content });
        cur = if !has_same_line_sep {
            after_content
        } else if let Some(next) = p.buffer.match_literal(after_content, sep) {
            next
        } else if let Some(alt) = alt_sep.and_then(|a| p.buffer.match_literal(after_content, a)) {
            alt
        } else {
            consume_to_next_line(p, after_content)
        };
        if p.buffer.is_bol(cur) {
            // A fresh structural line ends this cell run.
            if !matches!(p.src().as_bytes().get(cur), Some(b'|' | b'!')) {
                break;
            }
        } else {
            break;
        }
    }
    (cur, cells)
}

/// Finds where this cell's content ends (next `sep`/`alt_sep`, or
/// end-of-line) and whether a leading `attrs |` prefix is present. The final
/// `bool` is whether a same-line separator was actually found — `false`
/// marks the terminal cell on the line, whose content is parsed as a nested
/// block document rather than bounded inline content.
fn cell_bounds(p: &Parser, pos: usize, sep: &str, alt_sep: Option<&str>) -> (usize, Vec<Attribute>, usize, bool) {
    let src = p.src();
    let line_end = p.buffer.line_end(pos);
    let next_sep = find_first(src, pos, line_end, sep, alt_sep);
    let attr_end = src[pos..line_end].find('|').map(|n| pos + n);
    match attr_end {
        Some(bar) if next_sep.is_none_or(|s| bar < s) => {
            let (_, attrs) = line_attrs(p, pos);
            (next_sep.unwrap_or(line_end), attrs, bar + 1, next_sep.is_some())
        }
        _ => (next_sep.unwrap_or(line_end), Vec::new(), pos, next_sep.is_some()),
    }
}

fn find_first(src: &str, pos: usize, limit: usize, sep: &str, alt_sep: Option<&str>) -> Option<usize> {
    let slice = &src[pos..limit];
    let a = slice.find(sep).map(|n| pos + n);
    let b = alt_sep.and_then(|alt| slice.find(alt)).map(|n| pos + n);
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn cell_content_bounded(p: &Parser, pos: usize, limit: usize) -> (usize, Vec<crate::span::Spanned<crate::ast::Inline>>) {
    let mut out = Vec::new();
    let mut cur = pos;
    while cur < limit {
        let (next, mut nodes) = inline::inline_element_bounded(p, cur, limit);
        if next > limit || next == cur {
            break;
        }
        out.append(&mut nodes);
        cur = next;
    }
    (cur, out)
}

/// `table_mode_document`: the terminal cell's content, parsed as a run of
/// ordinary document blocks rather than a single inline run, so a cell can
/// hold its own nested list, table, or heading. Guarded by
/// `push_no_tableline` so block recognition never reads across a following
/// `|`/`!` structural line into the next cell or row.
fn cell_content_document(p: &Parser, pos: usize) -> (usize, Vec<Block>) {
    let _no_tableline = crate::engine::traps::Traps::push_no_tableline(&p.stacks);
    let mut out = Vec::new();
    let mut cur = pos;
    loop {
        if p.buffer.is_eof(cur) || (p.buffer.is_bol(cur) && is_table_structural_line(p, cur)) {
            break;
        }
        let (next, block) = p.document_block(cur);
        if next == cur {
            break;
        }
        out.push(block);
        cur = next;
    }
    (cur, out)
}

fn is_table_structural_line(p: &Parser, pos: usize) -> bool {
    let rest = p.src()[pos..].trim_start_matches([' ', '\t']);
    rest.starts_with('|') || rest.starts_with('!')
}
