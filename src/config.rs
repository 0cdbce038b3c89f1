//! Parser configuration: the caller-facing options, plus the fixed static
//! tables (HTML5 tag classification, default URL schemes) the main grammar
//! consults while dispatching on element name. `Configuration` owns its
//! data directly rather than deref'ing to an external source, since this
//! crate has no site-specific configuration source to load.

use std::collections::{HashMap, HashSet};

use phf::Set;

use crate::error::ConfigError;

/// The fixed default external link schemes.
pub static DEFAULT_SCHEMES: Set<&str> = phf::phf_set! {
    "http", "https", "ftp", "telnet", "irc", "ircs", "nntp",
    "worldwind", "mailto", "news", "svn", "git", "mms",
};

/// HTML-like tags whose content is inline and whose close tag is optional.
pub static INLINE_TAGS: Set<&str> = phf::phf_set! {
    "abbr", "br", "big", "b", "cite", "code", "data", "del", "dfn", "em",
    "font", "ins", "i", "kbd", "mark", "samp", "small", "span", "strong",
    "sub", "sup", "strike", "s", "time", "tt", "u", "var",
};

/// HTML-like tags whose content is a nested block document.
pub static BLOCK_WITH_BLOCKS_TAGS: Set<&str> = phf::phf_set! {
    "div", "center", "references",
};

/// Like [`BLOCK_WITH_BLOCKS_TAGS`], but indent-pre recognition is suppressed
/// inside the content (`wspre_off`).
pub static BLOCK_NO_INDENT_PRE_TAGS: Set<&str> = phf::phf_set! {
    "blockquote",
};

/// HTML-like tags whose content is inline only, with indent-pre suppressed.
pub static BLOCK_INLINE_ONLY_TAGS: Set<&str> = phf::phf_set! {
    "p",
};

/// The verbatim-content `<pre>` tag; `nowiki`'s close tag is mandatory inside.
pub static PRE_TAGS: Set<&str> = phf::phf_set! { "pre" };

/// The verbatim-content, non-block-nesting `<nowiki>` tag.
pub static NOWIKI_TAGS: Set<&str> = phf::phf_set! { "nowiki" };

/// Appears inline but its content is a nested block document with
/// `wspre_off`.
pub static REF_TAGS: Set<&str> = phf::phf_set! { "ref" };

/// `h1`..`h6`: content is heading-only inline content, no block nesting.
pub static HEADING_TAGS: Set<&str> = phf::phf_set! {
    "h1", "h2", "h3", "h4", "h5", "h6",
};

/// Table-family tags, each opening its own HTML-semantic scope.
pub static TABLE_FAMILY_TAGS: Set<&str> = phf::phf_set! {
    "table", "tr", "td", "th", "ul", "ol", "dl", "li", "dt", "dd",
};

/// Void (self-closing, no content) HTML5 tags recognized in element parsing.
pub static VOID_TAGS: Set<&str> = phf::phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img",
    "input", "link", "meta", "param", "source", "track", "wbr",
};

/// The default redirect magic word recognized at document start.
pub const DEFAULT_REDIRECT_WORD: &str = "#REDIRECT";

/// Options recognized by the core, plus the caller-extendable scheme and
/// behavior-switch sets.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Preserves the documented first-line-comment quirk when `false`
    /// (the default): a comment on the first line is never treated as
    /// "alone on its own line".
    pub strip_comments_on_first_line: bool,
    /// Whether the combinator evaluator consults and populates the memo
    /// table. Disabling this is a pure performance knob and must never
    /// change the tree produced.
    pub memoization: bool,
    /// Recognized external link / autolink schemes, lowercased.
    schemes: HashSet<String>,
    /// Additional `__WORD__` behavior switches recognized beyond the
    /// mandatory TOC markers, lowercased.
    behavior_switch_words: HashSet<String>,
    /// The magic word recognized at document start for redirect blocks.
    redirect_word: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strip_comments_on_first_line: false,
            memoization: true,
            schemes: DEFAULT_SCHEMES.iter().map(|s| (*s).to_owned()).collect(),
            behavior_switch_words: HashSet::new(),
            redirect_word: DEFAULT_REDIRECT_WORD.to_owned(),
        }
    }
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the recognized scheme set. Rejects an empty set, and rejects
    /// two entries that collide case-insensitively while disagreeing on
    /// case (`"HTTP"` alongside `"http"`) — such a pair can't both be kept,
    /// and silently keeping whichever sorts last would hide a caller typo.
    /// An exact duplicate is fine and simply collapses.
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashMap<String, String> = HashMap::new();
        for raw in schemes {
            let raw = raw.into();
            let lower = raw.to_lowercase();
            match seen.get(&lower) {
                Some(first) if *first != raw => return Err(ConfigError::ConflictingScheme(lower)),
                _ => {
                    seen.insert(lower, raw);
                }
            }
        }
        if seen.is_empty() {
            return Err(ConfigError::EmptySchemeSet);
        }
        self.schemes = seen.into_keys().collect::<HashSet<String>>();
        Ok(self)
    }

    pub fn with_behavior_switch_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.behavior_switch_words = words.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    pub fn with_strip_comments_on_first_line(mut self, yes: bool) -> Self {
        self.strip_comments_on_first_line = yes;
        self
    }

    pub fn with_memoization(mut self, yes: bool) -> Self {
        self.memoization = yes;
        self
    }

    pub fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme.to_lowercase())
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }

    pub fn is_behavior_switch(&self, word: &str) -> bool {
        self.behavior_switch_words.contains(&word.to_lowercase())
    }

    pub fn with_redirect_word<S: Into<String>>(mut self, word: S) -> Self {
        self.redirect_word = word.into();
        self
    }

    pub fn redirect_word(&self) -> &str {
        &self.redirect_word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schemes_include_http() {
        let config = Configuration::default();
        assert!(config.is_scheme_allowed("HTTP"));
        assert!(!config.is_scheme_allowed("gopher"));
    }

    #[test]
    fn empty_scheme_set_is_rejected() {
        let err = Configuration::new().with_schemes(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, ConfigError::EmptySchemeSet);
    }

    #[test]
    fn schemes_colliding_only_in_case_are_rejected() {
        let err = Configuration::new().with_schemes(["HTTP", "http"]).unwrap_err();
        assert_eq!(err, ConfigError::ConflictingScheme("http".to_owned()));
    }

    #[test]
    fn exact_duplicate_scheme_is_allowed() {
        let config = Configuration::new().with_schemes(["http", "http"]).unwrap();
        assert!(config.is_scheme_allowed("http"));
    }
}
