// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Named, compiled languages and auto-detection across them.

use std::rc::Rc;

use tracing::debug;

use crate::apperr;
use crate::highlighter::{GrammarDefinition, HighlightResult, Language, lang_hlsl};

/// Anything grammars can be registered with.
pub trait LanguageRegistry {
    fn register_language(&mut self, name: &str, grammar: GrammarDefinition) -> apperr::Result<()>;
}

/// Compiled languages keyed by lowercase name, in registration order.
///
/// Registering an equal grammar under a second name (an alias) shares the compiled [`Language`].
#[derive(Debug, Default)]
pub struct Registry {
    languages: Vec<(String, Rc<Language>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every grammar this crate ships.
    pub fn with_builtin_languages() -> apperr::Result<Self> {
        let mut registry = Self::new();
        lang_hlsl::register(&mut registry)?;
        Ok(registry)
    }

    fn find(&self, name: &str) -> Option<&Rc<Language>> {
        let name = name.to_ascii_lowercase();
        self.languages.iter().find(|(n, _)| *n == name).map(|(_, lang)| lang)
    }

    pub fn get_language(&self, name: &str) -> Option<&GrammarDefinition> {
        self.find(name).map(|lang| lang.grammar())
    }

    pub fn language_names(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|(name, _)| name.as_str())
    }

    /// The first registered name whose grammar lists `ext`. A leading dot is ignored.
    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.languages
            .iter()
            .find(|(_, lang)| lang.grammar().extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|(name, _)| name.as_str())
    }

    pub fn tokenize(&self, name: &str, text: &str) -> apperr::Result<HighlightResult> {
        let lang = self.find(name).ok_or_else(|| apperr::Error::UnknownLanguage(name.to_string()))?;
        Ok(lang.highlight(text))
    }

    /// Tokenizes `text` with every candidate and returns the highest scoring result.
    ///
    /// `subset` restricts the candidates to the given names. Unknown names are skipped.
    /// On equal scores the language registered first wins.
    pub fn highlight_auto(&self, text: &str, subset: Option<&[&str]>) -> Option<HighlightResult> {
        let mut seen: Vec<&Rc<Language>> = Vec::new();
        let mut best: Option<HighlightResult> = None;

        for (name, lang) in &self.languages {
            if let Some(subset) = subset
                && !subset.iter().any(|s| s.eq_ignore_ascii_case(name))
            {
                continue;
            }
            if seen.iter().any(|l| Rc::ptr_eq(l, lang)) {
                continue;
            }
            seen.push(lang);

            let result = lang.highlight(text);
            debug!(language = %name, score = result.score(), "auto-detect candidate");
            if best.as_ref().is_none_or(|b| result.score() > b.score()) {
                best = Some(result);
            }
        }

        best
    }
}

impl LanguageRegistry for Registry {
    fn register_language(&mut self, name: &str, grammar: GrammarDefinition) -> apperr::Result<()> {
        let name = name.to_ascii_lowercase();
        let shared = self.languages.iter().find(|(_, lang)| *lang.grammar() == grammar);
        let lang = match shared {
            Some((_, lang)) => lang.clone(),
            None => Rc::new(Language::compile(grammar)?),
        };
        debug!(name = %name, language = lang.name(), "registered language");

        match self.languages.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = lang,
            None => self.languages.push((name, lang)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlighter::{KeywordSet, TokenCategory, modes};

    fn comments_only() -> GrammarDefinition {
        GrammarDefinition {
            name: "Notes".to_string(),
            case_insensitive: false,
            extensions: vec!["txt".to_string()],
            keywords: vec![KeywordSet::from_list(TokenCategory::Keyword, "note")],
            rules: vec![modes::c_line_comment()],
        }
    }

    #[derive(Default)]
    struct Recorder {
        names: Vec<String>,
        grammars: Vec<GrammarDefinition>,
    }

    impl LanguageRegistry for Recorder {
        fn register_language(
            &mut self,
            name: &str,
            grammar: GrammarDefinition,
        ) -> apperr::Result<()> {
            self.names.push(name.to_string());
            self.grammars.push(grammar);
            Ok(())
        }
    }

    #[test]
    fn test_register_calls() {
        let mut recorder = Recorder::default();
        lang_hlsl::register(&mut recorder).unwrap();
        assert_eq!(recorder.names, ["hlsl", "sdsl"]);
        assert_eq!(recorder.grammars[0], recorder.grammars[1]);
    }

    #[test]
    fn test_alias_lookup() {
        let registry = Registry::with_builtin_languages().unwrap();
        assert_eq!(registry.language_names().collect::<Vec<_>>(), ["hlsl", "sdsl"]);

        let hlsl = registry.get_language("hlsl").unwrap();
        let sdsl = registry.get_language("SDSL").unwrap();
        assert_eq!(hlsl, sdsl);
        assert_eq!(hlsl.name, "HLSL");
        assert!(registry.get_language("glsl").is_none());
    }

    #[test]
    fn test_alias_shares_compiled_language() {
        let registry = Registry::with_builtin_languages().unwrap();
        assert!(Rc::ptr_eq(registry.find("hlsl").unwrap(), registry.find("sdsl").unwrap()));
    }

    #[test]
    fn test_unknown_language() {
        let registry = Registry::with_builtin_languages().unwrap();
        match registry.tokenize("glsl", "void main() {}") {
            Err(apperr::Error::UnknownLanguage(name)) => assert_eq!(name, "glsl"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_tokenize() {
        let registry = Registry::with_builtin_languages().unwrap();
        let src = "float4 c;";
        let result = registry.tokenize("sdsl", src).unwrap();
        assert_eq!(result.language, "HLSL");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].text(src), "float4");
    }

    #[test]
    fn test_reregister_overwrites() {
        let mut registry = Registry::with_builtin_languages().unwrap();
        registry.register_language("sdsl", comments_only()).unwrap();

        assert_eq!(registry.language_names().collect::<Vec<_>>(), ["hlsl", "sdsl"]);
        assert_eq!(registry.get_language("sdsl").unwrap().name, "Notes");
        assert_eq!(registry.get_language("hlsl").unwrap().name, "HLSL");
    }

    #[test]
    fn test_invalid_grammar_is_not_registered() {
        let mut registry = Registry::new();
        let mut grammar = comments_only();
        grammar.rules.push(modes::quote_string().with_illegal("["));

        assert!(registry.register_language("notes", grammar).is_err());
        assert_eq!(registry.language_names().count(), 0);
    }

    #[test]
    fn test_highlight_auto() {
        let mut registry = Registry::new();
        registry.register_language("notes", comments_only()).unwrap();
        lang_hlsl::register(&mut registry).unwrap();

        let shader = "float4 PSMain(float2 uv : TEXCOORD0) : SV_Target { return 0; }";
        let result = registry.highlight_auto(shader, None).unwrap();
        assert_eq!(result.language, "HLSL");

        let result = registry.highlight_auto(shader, Some(&["notes"])).unwrap();
        assert_eq!(result.language, "Notes");

        assert!(registry.highlight_auto(shader, Some(&["glsl"])).is_none());
    }

    #[test]
    fn test_highlight_auto_tie_goes_to_first() {
        let mut registry = Registry::new();
        registry.register_language("notes", comments_only()).unwrap();
        lang_hlsl::register(&mut registry).unwrap();

        let result = registry.highlight_auto("plain words", None).unwrap();
        assert_eq!(result.relevance, 0);
        assert_eq!(result.language, "Notes");
    }

    #[test]
    fn test_language_for_extension() {
        let registry = Registry::with_builtin_languages().unwrap();
        assert_eq!(registry.language_for_extension("fx"), Some("hlsl"));
        assert_eq!(registry.language_for_extension(".SDSL"), Some("hlsl"));
        assert_eq!(registry.language_for_extension("glsl"), None);
    }
}
