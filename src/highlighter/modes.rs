// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule fragments shared by C-like grammars.

use super::{TokenCategory, TokenRule};

/// `\` followed by any character, newlines (`\r\n` included) too. Carries no category of its own.
pub fn backslash_escape() -> TokenRule {
    TokenRule::new(r"\\(?:\r\n|[\s\S])").with_relevance(0)
}

/// `"..."` with backslash escapes. A raw newline ends the string as illegal.
pub fn quote_string() -> TokenRule {
    TokenRule::new(r#"""#)
        .with_end(r#"""#)
        .with_category(TokenCategory::String)
        .with_illegal(r"\r?\n")
        .with_contains(vec![backslash_escape()])
}

/// `// ...` up to the end of the line.
pub fn c_line_comment() -> TokenRule {
    TokenRule::new("//").with_end("$").with_category(TokenCategory::Comment)
}

/// `/* ... */`, possibly spanning lines.
pub fn c_block_comment() -> TokenRule {
    TokenRule::new(r"/\*").with_end(r"\*/").with_category(TokenCategory::Comment)
}
