/*!
# Java Parser

Lossless parser for the Java subset the rewrite engine works on.

## Features

- **Fast lexical analysis** with logos lexer
- **Lossless tree**: whitespace and comments stay attached to tokens
- **Printer** that reproduces unmodified input byte for byte
- **Formatting helpers** for inserted/removed annotations and imports

## Usage

```rust
use spring_rewrite::parser::{printer, JavaParser};

let source = "@Path(\"/troopers\")\npublic class TrooperResource {}\n";
let cu = JavaParser::new().parse_text(source)?;
assert_eq!(printer::print(&cu)?, source);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub mod ast;
pub mod format;
pub mod grammar;
pub mod lexer;
pub mod printer;

pub use ast::{Annotation, CompilationUnit, LeadingTrivia};
pub use lexer::{JavaLexer, Token, TokenKind};

use crate::core::ParseError;

/// Main Java parser
pub struct JavaParser {
    lexer: JavaLexer,
}

impl JavaParser {
    /// Creates a new parser instance
    pub fn new() -> Self {
        Self {
            lexer: JavaLexer::new(),
        }
    }

    /// Parses a Java compilation unit from a string
    pub fn parse_text(&self, input: &str) -> Result<CompilationUnit, ParseError> {
        let tokens = self.lexer.tokenize(input)?;
        grammar::parse_compilation_unit(input, tokens)
    }

    /// Parses annotation source such as `@RequestMapping("/x")` into a
    /// synthesized node: no trivia in front and no source offsets.
    pub fn parse_annotation(&self, input: &str) -> Result<Annotation, ParseError> {
        let mut tokens = self.lexer.tokenize(input.trim())?;
        for token in &mut tokens {
            token.offset = None;
        }
        if let Some(first) = tokens.first_mut() {
            first.leading.clear();
        }
        grammar::parse_annotation(input.trim(), tokens)
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotation_template() {
        let parser = JavaParser::new();
        let annotation = parser
            .parse_annotation("@RequestMapping(value = \"/{id}\", method = {GET, HEAD})")
            .unwrap();
        assert_eq!(annotation.simple_name(), "RequestMapping");
        assert_eq!(annotation.value_argument().unwrap().text(), "\"/{id}\"");
        assert!(annotation.at.offset.is_none());
        assert_eq!(
            printer::print_annotation(&annotation).unwrap(),
            "@RequestMapping(value = \"/{id}\", method = {GET, HEAD})"
        );
    }

    #[test]
    fn test_parse_annotation_rejects_trailing_input() {
        assert!(JavaParser::new().parse_annotation("@A class").is_err());
    }
}
