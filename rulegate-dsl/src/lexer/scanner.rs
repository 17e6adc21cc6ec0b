//! Lexer implementation

use super::token::*;
use rulegate_core::SyntaxError;
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer for rule expressions.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                '[' => {
                    self.advance();
                    TokenKind::LBracket
                }
                ']' => {
                    self.advance();
                    TokenKind::RBracket
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }

                '=' if self.peek_next_char() == Some('=') => self.advance_by(2, TokenKind::Eq),
                '!' if self.peek_next_char() == Some('=') => self.advance_by(2, TokenKind::Ne),
                '&' if self.peek_next_char() == Some('&') => self.advance_by(2, TokenKind::And),
                '|' if self.peek_next_char() == Some('|') => self.advance_by(2, TokenKind::Or),

                '>' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }

                '<' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::Le
                    } else {
                        TokenKind::Lt
                    }
                }

                '"' | '\'' => self.scan_string(c)?,

                '-' if self
                    .peek_next_char()
                    .map(|n| n.is_ascii_digit())
                    .unwrap_or(false) =>
                {
                    self.advance();
                    self.scan_number(start_pos)
                }

                c if c.is_ascii_digit() => self.scan_number(start_pos),

                c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

                c => {
                    return Err(SyntaxError::new(
                        format!("Unexpected character '{}' at position {}", c, start_pos),
                        start_line,
                        start_col,
                    ))
                }
            },
        };

        Ok(Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        })
    }

    /// Scan an identifier or keyword. Dots stay inside the identifier so that
    /// `billingAddress.city` is a single path token.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.source[start..self.pos];

        // Check keywords (case-insensitive)
        match ident.to_lowercase().as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "in" => TokenKind::In,
            "contains" => TokenKind::Contains,
            _ => TokenKind::Identifier(ident.to_string()),
        }
    }

    /// Scan a quoted string. A backslash takes the next character literally.
    fn scan_string(&mut self, quote: char) -> Result<TokenKind, SyntaxError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(SyntaxError::new(
                        format!("Unterminated string starting at position {}", start_pos),
                        start_line,
                        start_col,
                    ))
                }
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(SyntaxError::new(
                            format!("Unterminated string starting at position {}", start_pos),
                            start_line,
                            start_col,
                        ))
                    }
                },
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    /// Scan digits and dots. The text is not validated here: `1.2.3` is a
    /// single number token that the parser turns into NaN.
    fn scan_number(&mut self, start: usize) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::Number(self.source[start..self.pos].to_string())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance_by(&mut self, n: usize, kind: TokenKind) -> TokenKind {
        for _ in 0..n {
            self.advance();
        }
        kind
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
