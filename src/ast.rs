//! The document tree: a dozen block variants and two dozen inline variants,
//! plus the small value types they carry. `Block`/`Inline` are kept separate
//! rather than one flat token stream, since the preprocessor and main
//! grammar each build their own tree directly during parsing.

use std::fmt;

use crate::error::HeadingLevelError;
use crate::span::Spanned;

/// A validated heading level, 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = HeadingLevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=6).contains(&value) {
            Ok(HeadingLevel(value))
        } else {
            Err(HeadingLevelError(value))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ul,
    Ol,
    Dl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TocKind {
    Toc,
    NoToc,
    ForceToc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableCellKind {
    Data,
    Header,
}

/// An HTML-like element attribute. `value` is `None` for a bare boolean
/// attribute (e.g. `<input disabled>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// An HTML entity reference, kept unresolved unless the caller asks for its
/// code point via [`EntityRef::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Named(String),
    Decimal(u32),
    Hex(u32),
}

impl EntityRef {
    /// Resolves the entity to its code point, if it names a valid one.
    pub fn resolve(&self) -> Option<char> {
        match self {
            EntityRef::Named(name) => {
                let wrapped = format!("&{name};");
                let decoded = html_escape::decode_html_entities(&wrapped);
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if decoded != wrapped => Some(c),
                    _ => None,
                }
            }
            EntityRef::Decimal(n) | EntityRef::Hex(n) => char::from_u32(*n),
        }
    }
}

/// Content of a table cell or caption, before the post-processor's
/// single-block flattening pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Inline(Vec<Spanned<Inline>>),
    Blocks(Vec<Block>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub kind: TableCellKind,
    pub attrs: Vec<Attribute>,
    pub content: CellContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub attrs: Vec<Attribute>,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Spanned<Inline>>,
    pub sublists: Vec<Block>,
}

/// Content of an HTML-like block element, dispatched by its tag class.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlContent {
    /// `div`, `center`, `references`, `blockquote`, table-family tags.
    Blocks(Vec<Block>),
    /// `p`, heading tags used as elements.
    Inline(Vec<Spanned<Inline>>),
    /// `pre`: verbatim text, with `nowiki` honored inside.
    Raw(String),
    /// Void tags (`br`, `hr`, `wbr`, …).
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        inline: Vec<Spanned<Inline>>,
    },
    HorizontalRule,
    List {
        kind: ListKind,
        items: Vec<ListItem>,
    },
    Table {
        attrs: Vec<Attribute>,
        caption: Option<CellContent>,
        rows: Vec<TableRow>,
    },
    IndentPre {
        inline: Vec<Spanned<Inline>>,
    },
    Paragraph {
        inline: Vec<Spanned<Inline>>,
        leading_br: bool,
        trailing_br: bool,
    },
    TocMarker {
        kind: TocKind,
    },
    /// `#REDIRECT [[Target]]`, recognized at the start of a document.
    Redirect {
        link: Box<Spanned<Inline>>,
    },
    /// The `;term` half of a definition-list line, tagged separately from
    /// `DefDef` so a consumer can tell which half of a `;term:detail` pair a
    /// given entry is.
    DefTerm {
        content: Vec<Spanned<Inline>>,
    },
    /// The `:detail` half of a definition-list line (or a standalone
    /// `:`-led line with no preceding term).
    DefDef {
        content: Vec<Spanned<Inline>>,
    },
    Html {
        name: String,
        attrs: Vec<Attribute>,
        content: HtmlContent,
        self_closing: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Spanned<Inline>>),
    Italic(Vec<Spanned<Inline>>),
    BoldItalic(Vec<Spanned<Inline>>),
    InternalLink {
        target: String,
        text: Option<Vec<Spanned<Inline>>>,
        trail: Option<String>,
    },
    ExternalLink {
        url: String,
        text: Option<Vec<Spanned<Inline>>>,
    },
    PlainLink {
        url: String,
    },
    HtmlEntity(EntityRef),
    Nowiki(String),
    Comment(String),
    HtmlElement {
        name: String,
        attrs: Vec<Attribute>,
        content: Vec<Spanned<Inline>>,
        self_closing: bool,
    },
    /// `<ref>…</ref>`: appears inline, but its content is a nested block
    /// document.
    Ref {
        blocks: Vec<Block>,
    },
    LineBreak,
    /// A configured `__WORD__` behavior switch other than the mandatory TOC
    /// markers.
    BehaviorSwitch {
        name: String,
    },
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_rejects_out_of_range() {
        assert!(HeadingLevel::try_from(0).is_err());
        assert!(HeadingLevel::try_from(7).is_err());
        assert!(HeadingLevel::try_from(3).is_ok());
    }

    #[test]
    fn named_entity_resolves() {
        let amp = EntityRef::Named("amp".to_owned());
        assert_eq!(amp.resolve(), Some('&'));
        let bogus = EntityRef::Named("notarealentity".to_owned());
        assert_eq!(bogus.resolve(), None);
    }

    #[test]
    fn numeric_entity_resolves() {
        assert_eq!(EntityRef::Decimal(65).resolve(), Some('A'));
        assert_eq!(EntityRef::Hex(0x41).resolve(), Some('A'));
    }
}
