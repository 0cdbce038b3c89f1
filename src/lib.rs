//! A parser for MediaWiki-compatible wiki markup, built on a stateful PEG
//! engine: a preprocessor grammar resolves template/argument/link/inclusion
//! structure without evaluating it, then a main grammar parses the result
//! into a document tree.
//!
//! The two stages are exposed separately ([`preprocessor::preprocess`],
//! [`wikitext::parse`]) as well as combined ([`parse`]), since a caller
//! doing transclusion evaluation needs the preprocessor's token tree before
//! the main grammar ever runs.

pub mod ast;
pub mod config;
pub mod diagnostics;
mod engine;
pub mod error;
pub mod preprocessor;
pub mod span;
pub mod wikitext;

use ast::Block;
use config::Configuration;
use diagnostics::Diagnostic;
use span::FileMap;

/// The result of a full parse: preprocessing followed by the main grammar.
pub struct ParseOutput {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the preprocessor then the main grammar over its output, in direct-view
/// mode (no template evaluation — `includeonly` content is dropped and
/// `noinclude`/`onlyinclude` content is kept).
///
/// Collaborators wanting the preprocessor's token tree for transclusion
/// evaluation should call [`preprocessor::preprocess`] and [`wikitext::parse`]
/// directly instead.
pub fn parse(source: &str, config: &Configuration) -> ParseOutput {
    log::debug!("parsing {} bytes", source.len());
    let pre = preprocessor::preprocess(source, config);
    let main = wikitext::parse(&pre.text, config);

    // Each diagnostic's span is relative to whichever text its stage saw —
    // the original source for the preprocessor, the preprocessed text for
    // the main grammar — so each batch gets logged against its own map.
    let source_map = FileMap::new(source);
    for d in &pre.diagnostics {
        d.log(&source_map);
    }
    let preprocessed_map = FileMap::new(&pre.text);
    for d in &main.diagnostics {
        d.log(&preprocessed_map);
    }

    let mut diagnostics = pre.diagnostics;
    diagnostics.extend(main.diagnostics);

    ParseOutput {
        blocks: main.blocks,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_round_trip() {
        let config = Configuration::default();
        let out = parse("== Hello ==\n", &config);
        assert_eq!(out.blocks.len(), 1);
        assert!(matches!(&out.blocks[0], Block::Heading { level, .. } if level.get() == 2));
    }

    #[test]
    fn template_survives_preprocessing_into_plain_text() {
        let config = Configuration::default();
        let out = parse("{{t|a}}", &config);
        assert_eq!(out.blocks.len(), 1);
    }
}
