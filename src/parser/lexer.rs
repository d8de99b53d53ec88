/*!
# Java Lexical Analyzer

Lossless lexer for the Java subset handled by the rewrite engine.

Whitespace and comments never become tokens of their own: they are collected
as *leading trivia* of the next significant token, and the final trivia of a
file hangs on the [`TokenKind::Eof`] token. Concatenating `leading + text` of
every token reproduces the input byte for byte.

`>` is always lexed as a single character so that nested generics such as
`Map<String, List<Long>>` close one level at a time; shift operators come out
as consecutive `>` tokens, which is harmless for a lossless tree.
*/

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::core::ParseError;

/// Java token kinds
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Trivia
    #[regex(r"[ \t\f\r\n]+")]
    Whitespace,
    #[regex(r"//[^\r\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    // Names; keywords are classified after lexing
    #[regex(r"[A-Za-z_$\x{80}-\x{10FFFF}][A-Za-z0-9_$\x{80}-\x{10FFFF}]*")]
    Identifier,
    Keyword,

    // Literals
    #[regex(r#""([^"\\\r\n]|\\.)*""#)]
    StringLiteral,
    #[token("\"\"\"", lex_text_block)]
    TextBlock,
    #[regex(r"'([^'\\\r\n]|\\.)*'")]
    CharLiteral,
    #[regex(r"0[xX][0-9a-fA-F_]+[lL]?")]
    #[regex(r"0[bB][01_]+[lL]?")]
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?[fFdDlL]?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fFdD]?")]
    NumberLiteral,

    // Delimiters
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("@")]
    At,
    #[token("=")]
    Assign,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("&")]
    Ampersand,

    // Everything else an expression may contain
    #[regex(r"==|!=|<=|>=|&&|\|\||\+\+|--|\+=|-=|\*=|/=|%=|&=|\|=|\^=|<<=|<<|[+\-*/%!~|^]")]
    Operator,

    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral
                | TokenKind::TextBlock
                | TokenKind::CharLiteral
                | TokenKind::NumberLiteral
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::StringLiteral | TokenKind::TextBlock => "string literal",
            TokenKind::CharLiteral => "char literal",
            TokenKind::NumberLiteral => "number literal",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Ellipsis => "`...`",
            TokenKind::At => "`@`",
            TokenKind::Assign => "`=`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::Question => "`?`",
            TokenKind::Colon => "`:`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Arrow => "`->`",
            TokenKind::Ampersand => "`&`",
            TokenKind::Operator => "operator",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", name)
    }
}

/// Scans the body of a text block after its opening `"""`.
fn lex_text_block(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' => i += 2,
            b'"' if rest[i..].starts_with(b"\"\"\"") => {
                lex.bump(i + 3);
                return true;
            }
            _ => i += 1,
        }
    }
    false
}

/// Token with its leading trivia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Whitespace and comments preceding the token
    pub leading: String,
    /// Byte offset of `text` in the parsed source; `None` for synthesized tokens
    pub offset: Option<usize>,
}

impl Token {
    /// Synthesized token without trivia.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: String::new(),
            offset: None,
        }
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Identifier, text)
    }

    pub fn with_leading(mut self, leading: impl Into<String>) -> Self {
        self.leading = leading.into();
        self
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }

    /// Identifier with the given text (contextual keywords such as `record`
    /// are identifiers).
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == text
    }

    /// Same token text with different trivia; the original offset is dropped.
    pub fn renamed(&self, text: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            text: text.into(),
            leading: self.leading.clone(),
            offset: None,
        }
    }
}

/// Java lexer
pub struct JavaLexer {
    keywords: HashSet<&'static str>,
}

impl JavaLexer {
    pub fn new() -> Self {
        // Reserved words; contextual ones (var, record, sealed, permits, yield)
        // stay identifiers
        let keywords = [
            "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
            "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
            "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
            "interface", "long", "native", "new", "package", "private", "protected", "public",
            "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
            "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false",
            "null",
        ]
        .into_iter()
        .collect();

        Self { keywords }
    }

    /// Tokenize Java source. The result always ends with an `Eof` token.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut trivia = String::new();

        // A BOM that reached the lexer is kept as trivia
        let (base, body) = match input.strip_prefix('\u{FEFF}') {
            Some(rest) => {
                trivia.push('\u{FEFF}');
                (input.len() - rest.len(), rest)
            }
            None => (0, input),
        };

        let mut lexer = TokenKind::lexer(body);
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let text = lexer.slice();
            match result {
                Ok(kind) if kind.is_trivia() => trivia.push_str(text),
                Ok(kind) => {
                    let kind = if kind == TokenKind::Identifier && self.is_keyword(text) {
                        TokenKind::Keyword
                    } else {
                        kind
                    };
                    tokens.push(Token {
                        kind,
                        text: text.to_string(),
                        leading: std::mem::take(&mut trivia),
                        offset: Some(base + span.start),
                    });
                }
                Err(()) => {
                    let message = if text.starts_with("\"\"\"") {
                        "unterminated text block".to_string()
                    } else {
                        format!("unexpected character `{}`", text)
                    };
                    return Err(ParseError::at(input, base + span.start, message));
                }
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            leading: trivia,
            offset: Some(input.len()),
        });

        Ok(tokens)
    }

    /// Check if a word is a reserved Java keyword
    pub fn is_keyword(&self, text: &str) -> bool {
        self.keywords.contains(text)
    }
}

impl Default for JavaLexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `text` is a valid Java identifier (and not a reserved word).
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let first_ok = matches!(chars.next(), Some(c) if c == '_' || c == '$' || c.is_alphabetic());
    first_ok
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
        && !JavaLexer::new().is_keyword(text)
}
