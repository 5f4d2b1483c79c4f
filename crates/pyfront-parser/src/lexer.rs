//! Pyfront Lexer - Tokenizes Python-like source code
//!
//! Produces the token sequence the parser walks with a backtracking cursor.
//! Handles significant whitespace (INDENT/DEDENT tokens), implicit line
//! joining inside brackets and explicit `\` continuations.
//!
//! Keywords are not a separate token kind: they arrive as `Name` tokens and
//! the grammar matches them by raw text.
use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Token Types
// ─────────────────────────────────────────────────────────────────────────────

/// All possible token kinds, named after their Python tokenizer counterparts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    EndMarker,
    Newline,
    Indent,
    Dedent,

    // Text-bearing tokens
    Name,
    Number,
    String,

    // Delimiters
    LPar,      // (
    RPar,      // )
    LSqb,      // [
    RSqb,      // ]
    LBrace,    // {
    RBrace,    // }
    Colon,     // :
    Comma,     // ,
    Semi,      // ;
    Dot,       // .
    RArrow,    // ->
    Ellipsis,  // ...
    ColonEqual, // :=

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    DoubleSlash,  // //
    Percent,      // %
    DoubleStar,   // **
    At,           // @
    VBar,         // |
    Amper,        // &
    Circumflex,   // ^
    Tilde,        // ~
    LeftShift,    // <<
    RightShift,   // >>
    Less,         // <
    Greater,      // >
    EqEqual,      // ==
    NotEqual,     // !=
    LessEqual,    // <=
    GreaterEqual, // >=

    // Assignment
    Equal,            // =
    PlusEqual,        // +=
    MinEqual,         // -=
    StarEqual,        // *=
    SlashEqual,       // /=
    DoubleSlashEqual, // //=
    PercentEqual,     // %=
    DoubleStarEqual,  // **=
    AtEqual,          // @=
    VBarEqual,        // |=
    AmperEqual,       // &=
    CircumflexEqual,  // ^=
    LeftShiftEqual,   // <<=
    RightShiftEqual,  // >>=
}

impl TokenKind {
    /// Whether the raw text of the token participates in equality
    pub fn carries_text(self) -> bool {
        matches!(self, TokenKind::Name | TokenKind::Number | TokenKind::String)
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::EndMarker => "ENDMARKER",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::Name => "NAME",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::LPar => "LPAR",
            TokenKind::RPar => "RPAR",
            TokenKind::LSqb => "LSQB",
            TokenKind::RSqb => "RSQB",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Colon => "COLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Semi => "SEMI",
            TokenKind::Dot => "DOT",
            TokenKind::RArrow => "RARROW",
            TokenKind::Ellipsis => "ELLIPSIS",
            TokenKind::ColonEqual => "COLONEQUAL",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::DoubleSlash => "DOUBLESLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::DoubleStar => "DOUBLESTAR",
            TokenKind::At => "AT",
            TokenKind::VBar => "VBAR",
            TokenKind::Amper => "AMPER",
            TokenKind::Circumflex => "CIRCUMFLEX",
            TokenKind::Tilde => "TILDE",
            TokenKind::LeftShift => "LEFTSHIFT",
            TokenKind::RightShift => "RIGHTSHIFT",
            TokenKind::Less => "LESS",
            TokenKind::Greater => "GREATER",
            TokenKind::EqEqual => "EQEQUAL",
            TokenKind::NotEqual => "NOTEQUAL",
            TokenKind::LessEqual => "LESSEQUAL",
            TokenKind::GreaterEqual => "GREATEREQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::PlusEqual => "PLUSEQUAL",
            TokenKind::MinEqual => "MINEQUAL",
            TokenKind::StarEqual => "STAREQUAL",
            TokenKind::SlashEqual => "SLASHEQUAL",
            TokenKind::DoubleSlashEqual => "DOUBLESLASHEQUAL",
            TokenKind::PercentEqual => "PERCENTEQUAL",
            TokenKind::DoubleStarEqual => "DOUBLESTAREQUAL",
            TokenKind::AtEqual => "ATEQUAL",
            TokenKind::VBarEqual => "VBAREQUAL",
            TokenKind::AmperEqual => "AMPEREQUAL",
            TokenKind::CircumflexEqual => "CIRCUMFLEXEQUAL",
            TokenKind::LeftShiftEqual => "LEFTSHIFTEQUAL",
            TokenKind::RightShiftEqual => "RIGHTSHIFTEQUAL",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operators and delimiters, longest spelling first so that a prefix scan
/// always picks the maximal munch.
const PUNCTUATION: &[(&str, TokenKind)] = &[
    ("...", TokenKind::Ellipsis),
    ("**=", TokenKind::DoubleStarEqual),
    ("//=", TokenKind::DoubleSlashEqual),
    ("<<=", TokenKind::LeftShiftEqual),
    (">>=", TokenKind::RightShiftEqual),
    ("**", TokenKind::DoubleStar),
    ("//", TokenKind::DoubleSlash),
    ("==", TokenKind::EqEqual),
    ("!=", TokenKind::NotEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("<<", TokenKind::LeftShift),
    (">>", TokenKind::RightShift),
    ("->", TokenKind::RArrow),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinEqual),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
    ("|=", TokenKind::VBarEqual),
    ("&=", TokenKind::AmperEqual),
    ("^=", TokenKind::CircumflexEqual),
    ("@=", TokenKind::AtEqual),
    (":=", TokenKind::ColonEqual),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("@", TokenKind::At),
    ("=", TokenKind::Equal),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("|", TokenKind::VBar),
    ("&", TokenKind::Amper),
    ("^", TokenKind::Circumflex),
    ("~", TokenKind::Tilde),
    ("(", TokenKind::LPar),
    (")", TokenKind::RPar),
    ("[", TokenKind::LSqb),
    ("]", TokenKind::RSqb),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (":", TokenKind::Colon),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    (";", TokenKind::Semi),
];

/// A token with its raw source text and position information.
///
/// Equality and hashing look at the kind, plus the raw text for names,
/// numbers and strings. Positions never participate, which lets operator
/// tables be keyed by synthetic tokens.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub start: usize,  // Byte offset
    pub end: usize,    // Byte offset
    pub line: usize,   // 1-indexed
    pub column: usize, // 1-indexed
}

impl Token {
    pub fn new(
        kind: TokenKind,
        raw: impl Into<String>,
        start: usize,
        end: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Token {
            kind,
            raw: raw.into(),
            start,
            end,
            line,
            column,
        }
    }

    /// A position-less token, used as a lookup key
    pub fn synthetic(kind: TokenKind, raw: &str) -> Self {
        Token::new(kind, raw, 0, 0, 0, 0)
    }

    /// True for a `Name` token spelled exactly `word`
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Name && self.raw == word
    }

    /// Short human-readable description used in diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EndMarker => "end of input".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            _ => format!("'{}'", self.raw),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && (!self.kind.carries_text() || self.raw == other.raw)
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        if self.kind.carries_text() {
            self.raw.hash(state);
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} {:?}", self.line, self.column, self.kind, self.raw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lex error at {line}:{column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Compiled regex patterns for tokenization
struct LexerPatterns {
    ident: Regex,
    int_hex: Regex,
    int_oct: Regex,
    int_bin: Regex,
    int_dec: Regex,
    float_exp: Regex,
    float_simple: Regex,
    float_leading_dot: Regex,
}

impl LexerPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(LexerPatterns {
            ident: Regex::new(r"^[\p{Alphabetic}_][\p{Alphabetic}0-9_]*")?,
            int_hex: Regex::new(r"^0[xX][0-9a-fA-F_]+")?,
            int_oct: Regex::new(r"^0[oO][0-7_]+")?,
            int_bin: Regex::new(r"^0[bB][01_]+")?,
            int_dec: Regex::new(r"^[0-9][0-9_]*")?,
            float_exp: Regex::new(r"^[0-9][0-9_]*\.?[0-9_]*[eE][+-]?[0-9_]+")?,
            float_simple: Regex::new(r"^[0-9][0-9_]*\.[0-9_]*")?,
            float_leading_dot: Regex::new(r"^\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")?,
        })
    }
}

/// The lexer state
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    /// Whether the current logical line has produced a token yet
    line_has_tokens: bool,
    patterns: LexerPatterns,
    /// Newlines inside () [] {} are ignored
    bracket_depth: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Result<Self, LexError> {
        let patterns = LexerPatterns::new().map_err(|e| LexError {
            message: e.to_string(),
            line: 1,
            column: 1,
            offset: 0,
        })?;
        Ok(Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            line_has_tokens: false,
            patterns,
            bracket_depth: 0,
        })
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advance over `text`, which must be a prefix of the remaining input
    fn advance_over(&mut self, text: &str) {
        for _ in text.chars() {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn structural(&self, kind: TokenKind) -> Token {
        Token::new(kind, "", self.pos, self.pos, self.line, self.column)
    }

    /// Skip spaces, comments and backslash continuations (but not newlines)
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\x0c' | '\r') => {
                    self.advance();
                }
                Some('#') => self.skip_comment(),
                Some('\\') if self.remaining()[1..].trim_start_matches('\r').starts_with('\n') => {
                    while self.advance() != Some('\n') {}
                    // A continuation joins lines, so the next one is not a fresh line
                    self.at_line_start = false;
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Calculate indentation at current line start
    fn measure_indent(&mut self) -> usize {
        let mut indent = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => indent += 1,
                // Tab = advance to next multiple of 8
                '\t' => indent = (indent / 8 + 1) * 8,
                '\x0c' => indent = 0,
                _ => break,
            }
            self.advance();
        }
        indent
    }

    /// Handle indentation at line start, producing INDENT/DEDENT tokens
    fn handle_indent(&mut self) -> Result<Option<Token>, LexError> {
        if self.bracket_depth > 0 {
            self.at_line_start = false;
            return Ok(None);
        }
        if !self.at_line_start {
            return Ok(None);
        }

        // Blank and comment-only lines carry no indentation
        let indent = loop {
            let indent = self.measure_indent();
            if self.peek() == Some('#') {
                self.skip_comment();
            }
            if self.peek() == Some('\r') {
                self.advance();
            }
            match self.peek() {
                Some('\n') => {
                    self.advance();
                }
                None => {
                    self.at_line_start = false;
                    return Ok(None);
                }
                Some(_) => break indent,
            }
        };

        self.at_line_start = false;
        let current = self.indent_stack.last().copied().unwrap_or(0);

        if indent > current {
            self.indent_stack.push(indent);
            return Ok(Some(self.structural(TokenKind::Indent)));
        }
        if indent < current {
            while let Some(&top) = self.indent_stack.last() {
                if top <= indent {
                    break;
                }
                self.indent_stack.pop();
                self.pending_dedents += 1;
            }
            let new_current = self.indent_stack.last().copied().unwrap_or(0);
            if indent != new_current {
                return Err(self.error(format!(
                    "unindent does not match any outer indentation level: expected {} columns, got {}",
                    new_current, indent
                )));
            }
            self.pending_dedents -= 1;
            return Ok(Some(self.structural(TokenKind::Dedent)));
        }
        Ok(None)
    }

    fn try_match(&self, re: &Regex) -> Option<&'a str> {
        re.find(self.remaining()).map(|m| m.as_str())
    }

    /// Close the token stream: final NEWLINE, outstanding DEDENTs, ENDMARKER
    fn finish(&mut self) -> Token {
        if self.line_has_tokens {
            self.line_has_tokens = false;
            return self.structural(TokenKind::Newline);
        }
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            return self.structural(TokenKind::Dedent);
        }
        self.structural(TokenKind::EndMarker)
    }

    /// Lex the next token
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return Ok(self.structural(TokenKind::Dedent));
        }

        if let Some(tok) = self.handle_indent()? {
            return Ok(tok);
        }

        self.skip_trivia();

        let Some(ch) = self.peek() else {
            return Ok(self.finish());
        };

        let start = self.pos;
        let line = self.line;
        let column = self.column;

        if ch == '\n' {
            self.advance();
            if self.bracket_depth > 0 {
                return self.next_token();
            }
            self.line_has_tokens = false;
            return Ok(Token::new(TokenKind::Newline, "\n", start, self.pos, line, column));
        }

        self.line_has_tokens = true;

        if let Some(prefix_len) = self.string_prefix_len() {
            return self.lex_string(prefix_len, start, line, column);
        }

        if ch.is_ascii_digit() || (ch == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()))
        {
            return self.lex_number(start, line, column);
        }

        if ch.is_alphabetic() || ch == '_' {
            return self.lex_identifier(start, line, column);
        }

        if let Some(kind) = self.lex_punctuation() {
            match kind {
                TokenKind::LPar | TokenKind::LSqb | TokenKind::LBrace => self.bracket_depth += 1,
                TokenKind::RPar | TokenKind::RSqb | TokenKind::RBrace => {
                    self.bracket_depth = self.bracket_depth.saturating_sub(1);
                }
                _ => {}
            }
            let raw = &self.source[start..self.pos];
            return Ok(Token::new(kind, raw, start, self.pos, line, column));
        }

        Err(LexError {
            message: format!("unexpected character {:?}", ch),
            line,
            column,
            offset: start,
        })
    }

    fn lex_punctuation(&mut self) -> Option<TokenKind> {
        let remaining = self.remaining();
        let (spelling, kind) = PUNCTUATION
            .iter()
            .find(|(spelling, _)| remaining.starts_with(spelling))?;
        self.advance_over(spelling);
        Some(*kind)
    }

    /// Length of a string prefix (`r`, `b`, `rb`, `f`, `u`, ...) when the
    /// input at the cursor starts a string literal
    fn string_prefix_len(&self) -> Option<usize> {
        for (i, ch) in self.remaining().char_indices().take(3) {
            match ch {
                '"' | '\'' => return Some(i),
                'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F' if i < 2 => continue,
                _ => return None,
            }
        }
        None
    }

    /// Lex a string literal, keeping its prefix and quotes in the raw text
    fn lex_string(
        &mut self,
        prefix_len: usize,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<Token, LexError> {
        let prefix = &self.remaining()[..prefix_len];
        self.advance_over(prefix);

        let quote = if self.remaining().starts_with("\"\"\"") {
            "\"\"\""
        } else if self.remaining().starts_with("'''") {
            "'''"
        } else if self.remaining().starts_with('"') {
            "\""
        } else {
            "'"
        };
        let is_triple = quote.len() == 3;
        self.advance_over(quote);

        loop {
            if self.remaining().starts_with(quote) {
                self.advance_over(quote);
                break;
            }
            match self.peek() {
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                        line,
                        column,
                        offset: start,
                    });
                }
                Some('\n') if !is_triple => {
                    return Err(self.error("newline in single-quoted string"));
                }
                Some('\\') => {
                    // The escaped character never closes the literal, even in raw strings
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        // A triple-quoted string may cross lines without starting a new one
        if is_triple {
            self.at_line_start = false;
        }

        let raw = &self.source[start..self.pos];
        Ok(Token::new(TokenKind::String, raw, start, self.pos, line, column))
    }

    /// Lex a number literal; the raw spelling is kept as-is
    fn lex_number(&mut self, start: usize, line: usize, column: usize) -> Result<Token, LexError> {
        let patterns = [
            &self.patterns.int_hex,
            &self.patterns.int_oct,
            &self.patterns.int_bin,
            // Floats before integers to match longer patterns
            &self.patterns.float_exp,
            &self.patterns.float_simple,
            &self.patterns.float_leading_dot,
            &self.patterns.int_dec,
        ];
        let Some(matched) = patterns.into_iter().find_map(|re| self.try_match(re)) else {
            return Err(self.error("invalid number literal"));
        };
        self.advance_over(matched);

        // Imaginary suffix
        if matches!(self.peek(), Some('j' | 'J')) {
            self.advance();
        }

        let raw = &self.source[start..self.pos];
        Ok(Token::new(TokenKind::Number, raw, start, self.pos, line, column))
    }

    /// Lex an identifier or keyword; both are `Name` tokens
    fn lex_identifier(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<Token, LexError> {
        let Some(matched) = self.try_match(&self.patterns.ident) else {
            return Err(self.error("invalid identifier"));
        };
        self.advance_over(matched);
        Ok(Token::new(TokenKind::Name, matched, start, self.pos, line, column))
    }

    /// Tokenize entire source, returning all tokens up to and including ENDMARKER
    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EndMarker;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::trace!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }
}

/// Convenience function to tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source)?.tokenize_all()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tok_kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn tok_raws(source: &str) -> Vec<String> {
        tokenize(source).unwrap().into_iter().map(|t| t.raw).collect()
    }

    #[test]
    fn test_simple_expression() {
        // The last logical line still gets its NEWLINE without a trailing \n
        assert_eq!(
            tok_kinds("x + 1"),
            vec![
                TokenKind::Name,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(tok_kinds(""), vec![TokenKind::EndMarker]);
        assert_eq!(tok_kinds("\n\n# only a comment\n"), vec![TokenKind::EndMarker]);
    }

    #[test]
    fn test_keywords_are_names() {
        let tokens = tokenize("while not x").unwrap();
        assert!(tokens[0].is_word("while"));
        assert!(tokens[1].is_word("not"));
        assert_eq!(tokens[2].kind, TokenKind::Name);
    }

    #[test]
    fn test_token_equality_ignores_position() {
        let tokens = tokenize("a a 1").unwrap();
        assert_eq!(tokens[0], tokens[1]);
        assert_ne!(tokens[0], tokens[2]);
        assert_eq!(tokens[2], Token::synthetic(TokenKind::Number, "1"));
        // Operators compare by kind alone
        assert_eq!(
            Token::synthetic(TokenKind::Plus, "+"),
            Token::synthetic(TokenKind::Plus, "")
        );
    }

    #[test]
    fn test_string_raw_text_is_kept() {
        assert_eq!(
            tok_raws(r#"'a' rb"x\"y" """doc""""#)[..3],
            [
                "'a'".to_string(),
                r#"rb"x\"y""#.to_string(),
                r#""""doc""""#.to_string()
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("x = 'abc").unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tok_raws("42 3.14 0xff 0b101 1e10 .5 2j 1_000")[..8],
            ["42", "3.14", "0xff", "0b101", "1e10", ".5", "2j", "1_000"]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            tok_kinds("** **= // -> == := ...")[..7],
            [
                TokenKind::DoubleStar,
                TokenKind::DoubleStarEqual,
                TokenKind::DoubleSlash,
                TokenKind::RArrow,
                TokenKind::EqEqual,
                TokenKind::ColonEqual,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_indentation() {
        let source = "while x:\n    y = 1\n    z = 2\nw\n";
        let tokens = tok_kinds(source);
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
        assert_eq!(tokens.last(), Some(&TokenKind::EndMarker));
    }

    #[test]
    fn test_dedents_closed_at_eof() {
        let tokens = tok_kinds("if a:\n    if b:\n        c");
        let tail = &tokens[tokens.len() - 4..];
        assert_eq!(
            tail,
            [
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Dedent,
                TokenKind::EndMarker
            ]
        );
    }

    #[test]
    fn test_inconsistent_dedent() {
        let err = tokenize("if a:\n        b\n    c\n").unwrap_err();
        assert!(err.message.contains("unindent"));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_newlines_inside_brackets_are_skipped() {
        assert_eq!(
            tok_kinds("foo(\n    1,\n    2\n)\n"),
            vec![
                TokenKind::Name,
                TokenKind::LPar,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RPar,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn test_backslash_continuation() {
        assert_eq!(
            tok_kinds("x = 1 + \\\n    2\n"),
            vec![
                TokenKind::Name,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            tok_kinds("x  # trailing\n"),
            vec![TokenKind::Name, TokenKind::Newline, TokenKind::EndMarker]
        );
    }

    #[test]
    fn test_multiline_string_keeps_indentation() {
        let source = "while x:\n    \"\"\"Multi\nline\"\"\"\n    pass\n";
        let tokens = tok_kinds(source);
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
        assert!(tokenize(source).unwrap().iter().any(|t| t.is_word("pass")));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a ? b").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
