// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Regex driven tokenizer for [`GrammarDefinition`]s.
//!
//! ## Matching
//!
//! Every open region (the top level, or a rule with an `end` pattern) owns one combined regex:
//! the begin patterns of its nested rules in declared order, then its end pattern,
//! then its illegal pattern. The leftmost match wins. At the same offset the earlier entry wins.
//!
//! ## Gotchas
//!
//! - Text between matches is scanned for `\w+` lexemes against the region's keyword sets.
//!   That includes the begin and end lexemes of the region itself,
//!   which is how `#define` yields a `keyword` token inside the `meta` run.
//! - Nested rules without a category inherit the enclosing one, and adjacent runs of the
//!   same category are merged. A string with an escape sequence is still a single token.
//! - An illegal match closes the region *before* the illegal text and flags the result.
//!   Unterminated regions simply run to the end of the input.
//! - A zero-width begin match never opens a region. The engine steps over one character instead.

mod definitions;
pub mod lang_hlsl;
pub mod modes;

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

pub use self::definitions::*;
use crate::apperr;

/// A keyword stops adding relevance after this many hits.
const MAX_KEYWORD_HITS: u32 = 7;
/// Words too common across languages to say anything about the input.
const COMMON_KEYWORDS: &[&str] =
    &["of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value"];

/// A classified span of the input.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub category: TokenCategory,
    /// Byte range into the highlighted text.
    pub range: Range<usize>,
}

impl Token {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.range.clone()]
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {})", self.range, self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightResult {
    /// The grammar's display name.
    pub language: String,
    pub tokens: Vec<Token>,
    pub relevance: u32,
    /// Set when any region was closed by its illegal pattern.
    pub illegal: bool,
}

impl HighlightResult {
    /// The relevance used to rank languages against each other.
    pub fn score(&self) -> u32 {
        if self.illegal { 0 } else { self.relevance }
    }

    pub fn tokens_of(&self, category: TokenCategory) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.category == category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Begin(usize),
    End,
    Illegal,
}

struct Hit {
    range: Range<usize>,
    terminator: Terminator,
}

struct Region {
    rules: Vec<CompiledRule>,
    keywords: Vec<KeywordSet>,
    matcher: Option<Regex>,
    /// The capture group that identifies each terminator in `matcher`.
    groups: Vec<(usize, Terminator)>,
}

impl Region {
    fn find_at(&self, text: &str, pos: usize) -> Option<Hit> {
        let matcher = self.matcher.as_ref()?;
        let caps = matcher.captures_at(text, pos)?;
        let range = caps.get(0)?.range();
        let &(_, terminator) = self.groups.iter().find(|(group, _)| caps.get(*group).is_some())?;
        Some(Hit { range, terminator })
    }

    fn keyword_category(&self, word: &str) -> Option<TokenCategory> {
        self.keywords.iter().find(|set| set.contains(word)).map(|set| set.category)
    }
}

struct CompiledRule {
    category: Option<TokenCategory>,
    relevance: u32,
    region: Option<Region>,
}

struct RegionCompiler {
    case_insensitive: bool,
}

impl RegionCompiler {
    fn flags(&self) -> &'static str {
        // m: `$` is end of line. R: `\r\n` counts as one line terminator.
        if self.case_insensitive { "(?mRi)" } else { "(?mR)" }
    }

    fn compile_pattern(&self, rule: &str, pattern: &str) -> apperr::Result<Regex> {
        Regex::new(&format!("{}(?:{pattern})", self.flags())).map_err(|source| {
            apperr::Error::InvalidPattern {
                rule: rule.to_string(),
                pattern: pattern.to_string(),
                source,
            }
        })
    }

    fn compile_region(
        &self,
        path: &str,
        rules: &[TokenRule],
        end: Option<&str>,
        illegal: Option<&str>,
        keywords: &[KeywordSet],
    ) -> apperr::Result<Region> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut alternatives = Vec::with_capacity(rules.len() + 2);

        for (i, rule) in rules.iter().enumerate() {
            let rule_path = format!("{path}/{i}");
            let region = match &rule.end {
                Some(end) => Some(self.compile_region(
                    &rule_path,
                    &rule.contains,
                    Some(end),
                    rule.illegal.as_deref(),
                    &rule.keywords,
                )?),
                None => None,
            };
            compiled.push(CompiledRule {
                category: rule.category,
                relevance: rule.effective_relevance(),
                region,
            });
            alternatives.push((rule_path, rule.begin.as_str(), Terminator::Begin(i)));
        }
        if let Some(end) = end {
            alternatives.push((format!("{path}/end"), end, Terminator::End));
        }
        if let Some(illegal) = illegal {
            alternatives.push((format!("{path}/illegal"), illegal, Terminator::Illegal));
        }

        let mut combined = String::from(self.flags());
        let mut groups = Vec::with_capacity(alternatives.len());
        let mut next_group = 1;

        for (i, (rule_path, pattern, terminator)) in alternatives.iter().enumerate() {
            // Compiling each pattern on its own pins errors to the rule that caused them
            // and tells us how many capture groups it brings into the combined regex.
            let re = self.compile_pattern(rule_path, pattern)?;
            if i > 0 {
                combined.push('|');
            }
            combined.push('(');
            combined.push_str(pattern);
            combined.push(')');
            groups.push((next_group, *terminator));
            next_group += re.captures_len();
        }

        let matcher = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&combined).map_err(|source| apperr::Error::InvalidPattern {
                rule: path.to_string(),
                pattern: combined.clone(),
                source,
            })?)
        };

        let keywords = keywords
            .iter()
            .map(|set| if self.case_insensitive { set.to_lowercase() } else { set.clone() })
            .collect();

        Ok(Region { rules: compiled, keywords, matcher, groups })
    }
}

/// A [`GrammarDefinition`] with all of its patterns compiled.
pub struct Language {
    grammar: GrammarDefinition,
    root: Region,
    lexeme: Regex,
}

impl Language {
    pub fn compile(grammar: GrammarDefinition) -> apperr::Result<Self> {
        let compiler = RegionCompiler { case_insensitive: grammar.case_insensitive };
        let root =
            compiler.compile_region(&grammar.name, &grammar.rules, None, None, &grammar.keywords)?;
        let lexeme = compiler.compile_pattern(&grammar.name, r"\w+")?;

        debug!(language = %grammar.name, rules = grammar.rules.len(), "compiled language");
        Ok(Language { grammar, root, lexeme })
    }

    pub fn name(&self) -> &str {
        &self.grammar.name
    }

    pub fn grammar(&self) -> &GrammarDefinition {
        &self.grammar
    }

    pub fn highlight(&self, text: &str) -> HighlightResult {
        let result = Highlighter::new(self, text).run();
        trace!(
            language = %result.language,
            tokens = result.tokens.len(),
            relevance = result.relevance,
            illegal = result.illegal,
            "highlighted"
        );
        result
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language").field("name", &self.grammar.name).finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
struct Frame<'l> {
    region: &'l Region,
    category: Option<TokenCategory>,
}

struct Highlighter<'l, 't> {
    language: &'l Language,
    text: &'t str,
    state_stack: Vec<Frame<'l>>,
    tokens: Vec<Token>,
    relevance: u32,
    illegal: bool,
    keyword_hits: HashMap<&'t str, u32>,
}

impl<'l, 't> Highlighter<'l, 't> {
    fn new(language: &'l Language, text: &'t str) -> Self {
        Highlighter {
            language,
            text,
            state_stack: vec![Frame { region: &language.root, category: None }],
            tokens: Vec::new(),
            relevance: 0,
            illegal: false,
            keyword_hits: HashMap::new(),
        }
    }

    fn run(mut self) -> HighlightResult {
        let text = self.text;
        let mut pos = 0;

        // The root frame has neither an end nor an illegal pattern, so it is never popped.
        while let Some(&frame) = self.state_stack.last() {
            let Some(hit) = frame.region.find_at(text, pos) else {
                self.process_buffer(pos..text.len());
                break;
            };

            self.process_buffer(pos..hit.range.start);
            pos = hit.range.end;

            match hit.terminator {
                Terminator::Begin(_) if hit.range.is_empty() => {
                    let Some(ch) = text[pos..].chars().next() else {
                        break;
                    };
                    self.process_buffer(pos..pos + ch.len_utf8());
                    pos += ch.len_utf8();
                }
                Terminator::Begin(idx) => {
                    let rule = &frame.region.rules[idx];
                    let category = rule.category.or(frame.category);
                    self.relevance += rule.relevance;

                    match &rule.region {
                        None => self.emit(category, hit.range),
                        Some(region) => {
                            self.state_stack.push(Frame { region, category });
                            self.process_buffer(hit.range);
                        }
                    }
                }
                Terminator::End => {
                    self.process_buffer(hit.range);
                    self.state_stack.pop();
                }
                Terminator::Illegal => {
                    debug!(offset = hit.range.start, "illegal lexeme closed a region");
                    self.illegal = true;
                    self.state_stack.pop();
                    pos = hit.range.start;
                }
            }
        }

        HighlightResult {
            language: self.language.name().to_string(),
            tokens: self.tokens,
            relevance: self.relevance,
            illegal: self.illegal,
        }
    }

    /// Emits text that no rule claimed, picking out keywords on the way.
    fn process_buffer(&mut self, range: Range<usize>) {
        let Some(&frame) = self.state_stack.last() else {
            return;
        };
        if range.is_empty() {
            return;
        }
        if frame.region.keywords.is_empty() {
            self.emit(frame.category, range);
            return;
        }

        let language = self.language;
        let text = self.text;
        let mut last = range.start;

        for m in language.lexeme.find_iter(&text[range.clone()]) {
            let word = m.as_str();
            let category = if language.grammar.case_insensitive {
                frame.region.keyword_category(&word.to_lowercase())
            } else {
                frame.region.keyword_category(word)
            };
            let Some(category) = category else {
                continue;
            };

            let start = range.start + m.start();
            let end = range.start + m.end();
            self.emit(frame.category, last..start);
            self.emit(Some(category), start..end);
            self.count_keyword(word);
            last = end;
        }

        self.emit(frame.category, last..range.end);
    }

    fn count_keyword(&mut self, word: &'t str) {
        let hits = self.keyword_hits.entry(word).or_default();
        *hits += 1;
        if *hits <= MAX_KEYWORD_HITS && !COMMON_KEYWORDS.contains(&word) {
            self.relevance += 1;
        }
    }

    fn emit(&mut self, category: Option<TokenCategory>, range: Range<usize>) {
        let Some(category) = category else {
            return;
        };
        if range.is_empty() {
            return;
        }

        if let Some(last) = self.tokens.last_mut()
            && last.category == category
            && last.range.end == range.start
        {
            last.range.end = range.end;
        } else {
            self.tokens.push(Token { category, range });
        }
    }
}
