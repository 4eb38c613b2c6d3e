//! Lexer for the Lethe configuration language.

#[allow(unused_imports)]
use crate::trace;
use crate::span::Pos;
use crate::{is_ident_char, is_ident_start};

/// Kinds of tokens produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    /// A quoted string, including its quotes. May be unterminated;
    /// lexing stops at the end of the line.
    Str,
    /// A whole `<<DELIM ... DELIM` heredoc, start marker to end marker.
    Heredoc,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Equal,
    Comma,
    Dot,
    Colon,
    Question,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    FatArrow,
    Newline,
    Eof,
    Error,
}

/// A token with its source text and positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub start: Pos,
    pub end: Pos,
}

/// A lexer that produces tokens from Lethe source text.
///
/// Infallible: anything it cannot classify becomes an [`TokenKind::Error`]
/// token and lexing continues, so the parser always sees the whole file.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current position in `source`.
    pos: Pos,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: Pos::INITIAL,
        }
    }

    /// Get the current position.
    #[inline]
    pub fn position(&self) -> Pos {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.byte += c.len_utf8() as u32;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: Pos) -> Token<'src> {
        let text = &self.source[start.byte as usize..self.pos.byte as usize];
        trace!("token {:?} at {}..{}: {:?}", kind, start, self.pos, text);
        Token {
            kind,
            text,
            start,
            end: self.pos,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();

        if self.is_eof() {
            return self.token(TokenKind::Eof, self.pos);
        }

        let start = self.pos;
        let c = self.peek().unwrap();

        match c {
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, start)
            }
            '{' => self.punct(TokenKind::LBrace, start),
            '}' => self.punct(TokenKind::RBrace, start),
            '[' => self.punct(TokenKind::LBracket, start),
            ']' => self.punct(TokenKind::RBracket, start),
            '(' => self.punct(TokenKind::LParen, start),
            ')' => self.punct(TokenKind::RParen, start),
            ',' => self.punct(TokenKind::Comma, start),
            '.' => self.punct(TokenKind::Dot, start),
            ':' => self.punct(TokenKind::Colon, start),
            '?' => self.punct(TokenKind::Question, start),
            '+' => self.punct(TokenKind::Plus, start),
            '*' => self.punct(TokenKind::Star, start),
            '/' => self.punct(TokenKind::Slash, start),
            '%' => self.punct(TokenKind::Percent, start),
            '-' => self.punct(TokenKind::Minus, start),
            '=' if self.starts_with("==") => self.punct2(TokenKind::EqEq, start),
            '=' if self.starts_with("=>") => self.punct2(TokenKind::FatArrow, start),
            '=' => self.punct(TokenKind::Equal, start),
            '!' if self.starts_with("!=") => self.punct2(TokenKind::NotEq, start),
            '!' => self.punct(TokenKind::Bang, start),
            '<' if self.starts_with("<<") => self.lex_heredoc(start),
            '<' if self.starts_with("<=") => self.punct2(TokenKind::LtEq, start),
            '<' => self.punct(TokenKind::Lt, start),
            '>' if self.starts_with(">=") => self.punct2(TokenKind::GtEq, start),
            '>' => self.punct(TokenKind::Gt, start),
            '&' if self.starts_with("&&") => self.punct2(TokenKind::AndAnd, start),
            '|' if self.starts_with("||") => self.punct2(TokenKind::OrOr, start),
            '"' => self.lex_string(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            c if is_ident_start(c) => self.lex_ident(start),
            _ => {
                self.advance();
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Skip spaces, tabs, carriage returns and comments (`#`, `//`).
    /// Newlines are significant and stay.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('#') => self.skip_line(),
                Some('/') if self.starts_with("//") => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn punct(&mut self, kind: TokenKind, start: Pos) -> Token<'src> {
        self.advance();
        self.token(kind, start)
    }

    fn punct2(&mut self, kind: TokenKind, start: Pos) -> Token<'src> {
        self.advance();
        self.advance();
        self.token(kind, start)
    }

    fn lex_ident(&mut self, start: Pos) -> Token<'src> {
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Ident, start)
    }

    fn lex_number(&mut self, start: Pos) -> Token<'src> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_nth(1), Some('+' | '-')) {
                lookahead = 2;
            }
            if matches!(self.peek_nth(lookahead), Some(c) if c.is_ascii_digit()) {
                for _ in 0..=lookahead {
                    self.advance();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Number, start)
    }

    /// Lex a quoted string, quotes included. An unterminated string
    /// runs to the end of the line so the rest of the file still
    /// lexes sanely.
    fn lex_string(&mut self, start: Pos) -> Token<'src> {
        self.advance(); // opening quote
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    return self.token(TokenKind::Str, start);
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    if self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Str, start)
    }

    /// Lex a whole heredoc: `<<DELIM` (or `<<-DELIM`), content lines,
    /// up to and including the line holding the bare delimiter. At EOF
    /// without a delimiter the token simply ends there.
    fn lex_heredoc(&mut self, start: Pos) -> Token<'src> {
        self.advance(); // <
        self.advance(); // <
        if self.peek() == Some('-') {
            self.advance();
        }
        let delim_start = self.pos.byte as usize;
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.advance();
        }
        let delimiter = self.source[delim_start..self.pos.byte as usize].to_string();
        if delimiter.is_empty() {
            return self.token(TokenKind::Error, start);
        }
        // Skip the rest of the marker line.
        self.skip_line();
        self.advance(); // newline (no-op at EOF)

        loop {
            if self.is_eof() {
                break;
            }
            let line_rest = self.remaining.split('\n').next().unwrap_or("");
            if line_rest.trim() == delimiter {
                // Consume up to the end of the delimiter word.
                let trimmed_len =
                    line_rest.len() - line_rest.trim_start().len() + delimiter.len();
                for _ in 0..trimmed_len {
                    self.advance();
                }
                break;
            }
            self.skip_line();
            self.advance();
        }
        self.token(TokenKind::Heredoc, start)
    }
}
