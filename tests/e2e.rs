//! End-to-end scenarios exercising representative markup constructs through
//! the crate's combined `parse()` entry point.

use pretty_assertions::assert_eq;
use wikitext_core::ast::{Block, HeadingLevel, Inline, ListKind, TableCellKind};
use wikitext_core::config::Configuration;

fn parse(src: &str) -> Vec<Block> {
    let _ = env_logger::try_init();
    wikitext_core::parse(src, &Configuration::default()).blocks
}

/// Scenario 1: a level-2 heading, no trailing `<br/>`.
#[test]
fn heading_with_no_trailing_break() {
    let blocks = parse("== Hello ==\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::Heading { level, inline } => {
            assert_eq!(level.get(), 2);
            assert_eq!(inline.len(), 1);
            assert_eq!(inline[0].node, Inline::Text("Hello".to_owned()));
        }
        other => panic!("expected Heading, got {other:?}"),
    }
}

/// Scenario 2: nested unordered lists, `* a\n** b\n* c\n`.
#[test]
fn nested_unordered_list() {
    let blocks = parse("* a\n** b\n* c\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::List { kind, items } => {
            assert_eq!(*kind, ListKind::Ul);
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].content[0].node, Inline::Text("a".to_owned()));
            assert_eq!(items[0].sublists.len(), 1);
            match &items[0].sublists[0] {
                Block::List { kind, items } => {
                    assert_eq!(*kind, ListKind::Ul);
                    assert_eq!(items[0].content[0].node, Inline::Text("b".to_owned()));
                }
                other => panic!("expected nested List, got {other:?}"),
            }
            assert_eq!(items[1].content[0].node, Inline::Text("c".to_owned()));
            assert!(items[1].sublists.is_empty());
        }
        other => panic!("expected List, got {other:?}"),
    }
}

/// Scenario 3: a table with a header row and a data row.
#[test]
fn table_with_header_and_data_rows() {
    let blocks = parse("{| class=\"x\"\n|-\n! H1 !! H2\n|-\n| a || b\n|}\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::Table { attrs, rows, .. } => {
            assert_eq!(attrs.len(), 1);
            assert_eq!(attrs[0].name, "class");
            assert_eq!(attrs[0].value.as_deref(), Some("x"));
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].cells.len(), 2);
            assert!(rows[0].cells.iter().all(|c| c.kind == TableCellKind::Header));
            assert_eq!(rows[1].cells.len(), 2);
            assert!(rows[1].cells.iter().all(|c| c.kind == TableCellKind::Data));
        }
        other => panic!("expected Table, got {other:?}"),
    }
}

/// Scenario 4: `'''a''b'''c''` — nested bold/italic, followed by plain text
/// and a dangling closer with no content.
#[test]
fn nested_bold_italic_and_dangling_closer() {
    let blocks = parse("'''a''b'''c''");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::Paragraph { inline, .. } => {
            assert!(matches!(&inline[0].node, Inline::Bold(content) if content.len() == 2));
            if let Inline::Bold(content) = &inline[0].node {
                assert_eq!(content[0].node, Inline::Text("a".to_owned()));
                assert!(matches!(&content[1].node, Inline::Italic(inner) if inner[0].node == Inline::Text("b".to_owned())));
            }
        }
        other => panic!("expected Paragraph, got {other:?}"),
    }
}

/// Scenario 5: indent-pre with an embedded line break.
#[test]
fn indent_pre_with_line_break() {
    let blocks = parse(" hello\n world\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::IndentPre { inline } => {
            assert_eq!(inline[0].node, Inline::Text("hello".to_owned()));
            assert_eq!(inline[1].node, Inline::LineBreak);
            assert_eq!(inline[2].node, Inline::Text("world".to_owned()));
        }
        other => panic!("expected IndentPre, got {other:?}"),
    }
}

/// Scenario 6: `[[foo|bar]]baz` — internal link with display text and trail.
#[test]
fn internal_link_with_text_and_trail() {
    let blocks = parse("[[foo|bar]]baz");
    match &blocks[0] {
        Block::Paragraph { inline, .. } => match &inline[0].node {
            Inline::InternalLink { target, text: display, trail } => {
                assert_eq!(target, "foo");
                assert_eq!(display.as_ref().unwrap()[0].node, Inline::Text("bar".to_owned()));
                assert_eq!(trail.as_deref(), Some("baz"));
            }
            other => panic!("expected InternalLink, got {other:?}"),
        },
        other => panic!("expected Paragraph, got {other:?}"),
    }
}

/// Scenario 7 (preprocessor): `{{t|a|k=v}}` round-tripped through the
/// combined parse as plain (unevaluated) template text.
#[test]
fn template_is_preserved_verbatim_through_combined_parse() {
    let blocks = parse("{{t|a|k=v}}");
    match &blocks[0] {
        Block::Paragraph { inline, .. } => {
            let joined: String = inline
                .iter()
                .map(|n| match &n.node {
                    Inline::Text(t) => t.clone(),
                    _ => String::new(),
                })
                .collect();
            assert_eq!(joined, "{{t|a|k=v}}");
        }
        other => panic!("expected Paragraph, got {other:?}"),
    }
}

/// Scenario 8 (preprocessor, via combined parse): a mid-document
/// comment-alone swallows one newline.
#[test]
fn comment_alone_swallows_newline_through_combined_parse() {
    let blocks = parse("x\n<!-- c -->\ny\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::Paragraph { inline, .. } => {
            let joined: String = inline
                .iter()
                .map(|n| match &n.node {
                    Inline::Text(t) => t.clone(),
                    _ => String::new(),
                })
                .collect();
            assert_eq!(joined, "xy");
        }
        other => panic!("expected Paragraph, got {other:?}"),
    }
}

#[test]
fn redirect_block_at_document_start() {
    let blocks = parse("#REDIRECT [[Target]]\n");
    assert_eq!(blocks.len(), 1);
    match &blocks[0] {
        Block::Redirect { link } => match &link.node {
            Inline::InternalLink { target, .. } => assert_eq!(target, "Target"),
            other => panic!("expected InternalLink, got {other:?}"),
        },
        other => panic!("expected Redirect, got {other:?}"),
    }
}

#[test]
fn heading_level_try_from_round_trips() {
    let level = HeadingLevel::try_from(3).unwrap();
    assert_eq!(level.get(), 3);
}
