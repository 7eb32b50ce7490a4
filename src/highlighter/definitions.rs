// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Plain data describing a language: keyword tables and an ordered list of token rules.
//!
//! Nothing in here is validated. Patterns are kept as strings until
//! [`Language::compile`](super::Language::compile) turns them into matchers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

/// The classification applied to a matched span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenCategory {
    Keyword,
    Type,
    BuiltIn,
    Literal,
    Number,
    String,
    Comment,
    Meta,
    Symbol,
    TitleFunction,
}

impl TokenCategory {
    pub const ALL: [TokenCategory; 10] = [
        TokenCategory::Keyword,
        TokenCategory::Type,
        TokenCategory::BuiltIn,
        TokenCategory::Literal,
        TokenCategory::Number,
        TokenCategory::String,
        TokenCategory::Comment,
        TokenCategory::Meta,
        TokenCategory::Symbol,
        TokenCategory::TitleFunction,
    ];

    /// The scope name, e.g. `built_in` or `title.function`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Keyword => "keyword",
            TokenCategory::Type => "type",
            TokenCategory::BuiltIn => "built_in",
            TokenCategory::Literal => "literal",
            TokenCategory::Number => "number",
            TokenCategory::String => "string",
            TokenCategory::Comment => "comment",
            TokenCategory::Meta => "meta",
            TokenCategory::Symbol => "symbol",
            TokenCategory::TitleFunction => "title.function",
        }
    }

    pub fn from_scope(scope: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == scope)
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A set of identifiers that all map to the same [`TokenCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    pub category: TokenCategory,
    pub words: BTreeSet<String>,
}

impl KeywordSet {
    pub fn new<I, S>(category: TokenCategory, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeywordSet { category, words: words.into_iter().map(Into::into).collect() }
    }

    /// Builds a set from a whitespace separated list, e.g. `"true false NULL"`.
    pub fn from_list(category: TokenCategory, list: &str) -> Self {
        Self::new(category, list.split_whitespace())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub(crate) fn to_lowercase(&self) -> Self {
        Self::new(self.category, self.words.iter().map(|w| w.to_lowercase()))
    }
}

/// One matching rule.
///
/// A rule without an `end` pattern is a single match: the text matched by `begin` becomes one token.
/// A rule with an `end` pattern opens a region that lasts until `end` matches (inclusive)
/// or `illegal` matches (exclusive). Inside the region only `contains` and `keywords` apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    pub begin: String,
    pub end: Option<String>,
    /// `None` inherits the category of the enclosing region.
    pub category: Option<TokenCategory>,
    pub contains: Vec<TokenRule>,
    pub keywords: Vec<KeywordSet>,
    /// Defaults to 1.
    pub relevance: Option<u32>,
    pub illegal: Option<String>,
}

impl TokenRule {
    pub fn new(begin: impl Into<String>) -> Self {
        TokenRule {
            begin: begin.into(),
            end: None,
            category: None,
            contains: Vec::new(),
            keywords: Vec::new(),
            relevance: None,
            illegal: None,
        }
    }

    /// A single-match rule made of ordered alternatives.
    /// The first alternative that matches at a position wins, so put the longer forms first.
    pub fn variants(category: TokenCategory, variants: &[&str]) -> Self {
        let mut begin = String::new();
        for (i, v) in variants.iter().enumerate() {
            if i > 0 {
                begin.push('|');
            }
            begin.push_str("(?:");
            begin.push_str(v);
            begin.push(')');
        }
        Self::new(begin).with_category(category)
    }

    pub fn with_category(mut self, category: TokenCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_contains(mut self, contains: Vec<TokenRule>) -> Self {
        self.contains = contains;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<KeywordSet>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_illegal(mut self, illegal: impl Into<String>) -> Self {
        self.illegal = Some(illegal.into());
        self
    }

    pub fn effective_relevance(&self) -> u32 {
        self.relevance.unwrap_or(1)
    }
}

/// Everything the tokenizer needs to know about a language.
///
/// `rules` is ordered: at a given position the earlier rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarDefinition {
    pub name: String,
    pub case_insensitive: bool,
    /// File extensions without the leading dot.
    pub extensions: Vec<String>,
    pub keywords: Vec<KeywordSet>,
    pub rules: Vec<TokenRule>,
}

impl GrammarDefinition {
    pub fn keyword_set(&self, category: TokenCategory) -> Option<&KeywordSet> {
        self.keywords.iter().find(|set| set.category == category)
    }
}
