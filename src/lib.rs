// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Syntax highlighting for HLSL and SDSL shader sources.
//!
//! Grammars are plain data ([`highlighter::GrammarDefinition`]), compiled into regex matchers
//! by [`highlighter::Language::compile`] and looked up by name through a [`registry::Registry`].

pub mod apperr;
pub mod highlighter;
pub mod registry;
