//! The AST builder's post-processing pass. Runs after a full parse, walking
//! the tree the grammar already built rather than being threaded through
//! parsing itself — heading levels, list kinds, and table cell kinds are
//! attached directly by the grammar, so this pass handles the two
//! structural normalizations that only make sense once the whole tree
//! exists, plus recursing into nested documents (`Ref`, HTML block content,
//! table cells).

use crate::ast::{Block, CellContent, HtmlContent, Inline, ListItem};
use crate::span::Spanned;

pub fn postprocess(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        postprocess_block(block);
    }
}

fn postprocess_block(block: &mut Block) {
    match block {
        Block::List { items, .. } => {
            postprocess_items(items);
        }
        Block::Table { caption, rows, .. } => {
            if let Some(content) = caption {
                flatten_cell_content(content);
            }
            for row in rows.iter_mut() {
                for cell in row.cells.iter_mut() {
                    flatten_cell_content(&mut cell.content);
                }
            }
        }
        Block::Html { content, .. } => match content {
            HtmlContent::Blocks(blocks) => postprocess(blocks),
            HtmlContent::Inline(inline) => postprocess_inline(inline),
            HtmlContent::Raw(_) | HtmlContent::None => {}
        },
        Block::Heading { inline, .. }
        | Block::IndentPre { inline }
        | Block::Paragraph { inline, .. } => postprocess_inline(inline),
        Block::DefTerm { content } | Block::DefDef { content } => postprocess_inline(content),
        Block::Redirect { link } => postprocess_one_inline(link),
        Block::HorizontalRule | Block::TocMarker { .. } => {}
    }
}

/// Normalizes list items: a `ListItem` with no content of its own and
/// exactly one sublist that is itself a nested `List` is a pure nesting
/// artifact and is collapsed into that sublist's items directly. A lone
/// `DefTerm`/`DefDef` sublist is not a nesting artifact — it is the item's
/// actual tagged content — so it is left alone.
fn postprocess_items(items: &mut Vec<ListItem>) {
    let mut out = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
        postprocess_inline(&mut item.content);
        for sub in item.sublists.iter_mut() {
            postprocess_block(sub);
        }
        if item.content.is_empty() && item.sublists.len() == 1 && matches!(item.sublists[0], Block::List { .. }) {
            let Block::List { items: mut inner, .. } = item.sublists.pop().unwrap() else {
                unreachable!("just matched Block::List above");
            };
            out.append(&mut inner);
            continue;
        }
        out.push(item);
    }
    *items = out;
}

/// Flattens a cell or caption whose body is a single paragraph-like block
/// into plain inline content.
fn flatten_cell_content(content: &mut CellContent) {
    if let CellContent::Blocks(blocks) = content {
        if blocks.len() == 1 {
            let single = match &blocks[0] {
                Block::Paragraph { inline, .. } | Block::Heading { inline, .. } | Block::IndentPre { inline } => {
                    Some(inline.clone())
                }
                _ => None,
            };
            if let Some(mut inline) = single {
                postprocess_inline(&mut inline);
                *content = CellContent::Inline(inline);
                return;
            }
        }
        postprocess(blocks);
    } else if let CellContent::Inline(inline) = content {
        postprocess_inline(inline);
    }
}

fn postprocess_inline(nodes: &mut [Spanned<Inline>]) {
    for node in nodes.iter_mut() {
        postprocess_one_inline(node);
    }
}

fn postprocess_one_inline(node: &mut Spanned<Inline>) {
    match &mut node.node {
        Inline::Bold(content) | Inline::Italic(content) | Inline::BoldItalic(content) => {
            postprocess_inline(content);
        }
        Inline::InternalLink { text: Some(content), .. } | Inline::ExternalLink { text: Some(content), .. } => {
            postprocess_inline(content);
        }
        Inline::HtmlElement { content, .. } => postprocess_inline(content),
        Inline::Ref { blocks } => postprocess(blocks),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListKind;

    #[test]
    fn empty_content_single_sublist_item_collapses() {
        let mut items = vec![ListItem {
            content: Vec::new(),
            sublists: vec![Block::List {
                kind: ListKind::Ul,
                items: vec![ListItem { content: vec![Spanned::new(Inline::Text("x".into()), 0, 1)], sublists: Vec::new() }],
            }],
        }];
        postprocess_items(&mut items);
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0].content[0].node, Inline::Text(t) if t == "x"));
    }
}
