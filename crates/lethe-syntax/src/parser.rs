//! Recursive-descent, error-recovering parser for Lethe.
//!
//! `parse` never fails: it always produces a [`File`] plus a list of
//! [`ParseError`]s. Editors call this on every keystroke, so recovery
//! matters more than rejection: half-typed attributes keep their
//! names, unclosed blocks keep their bodies, and garbage is skipped a
//! line at a time.

use std::fmt;

#[allow(unused_imports)]
use crate::trace;
use crate::ast::{
    Attribute, BinaryOp, Block, BlockLabel, Body, ExprKind, Expression, File, FileBody, ForExpr,
    ObjectItem, TravStep, TravStepKind, UnaryOp,
};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::span::{Pos, Range, Span};

/// Error that can occur during Lethe parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for ParseError {}

/// Kind of Lethe parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token.
    UnexpectedToken { got: String, expected: &'static str },
    /// An identifier that never became an attribute or block header.
    /// Typically the statement being typed right now.
    DanglingIdentifier { name: String },
    /// A block whose `}` never arrived.
    UnclosedBlock { block_type: String },
    /// A collection or parenthesized expression missing its closer.
    UnclosedDelimiter { expected: &'static str },
    /// `=` with no expression where one was required.
    ExpectedExpression,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedToken { got, expected } => {
                write!(f, "unexpected token '{}', expected {}", got, expected)
            }
            ParseErrorKind::DanglingIdentifier { name } => {
                write!(f, "'{}' is not an attribute or block", name)
            }
            ParseErrorKind::UnclosedBlock { block_type } => {
                write!(f, "unclosed block '{}'", block_type)
            }
            ParseErrorKind::UnclosedDelimiter { expected } => {
                write!(f, "missing closing {}", expected)
            }
            ParseErrorKind::ExpectedExpression => write!(f, "expected an expression"),
        }
    }
}

/// Parse `source` into a [`File`] in the native dialect.
pub fn parse(filename: &str, source: &str) -> (File, Vec<ParseError>) {
    let mut parser = Parser::new(filename, source);
    let (attributes, blocks) = parser.parse_statements(true);
    let eof = parser.peek().start;
    let body = Body {
        attributes,
        blocks,
        range: Range::new(filename, Pos::INITIAL, eof),
    };
    let file = File {
        filename: filename.to_string(),
        source: source.to_string(),
        body: FileBody::Native(body),
    };
    (file, parser.errors)
}

struct Parser<'src> {
    filename: &'src str,
    source: &'src str,
    lexer: Lexer<'src>,
    peeked: Option<Token<'src>>,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    fn new(filename: &'src str, source: &'src str) -> Self {
        Self {
            filename,
            source,
            lexer: Lexer::new(source),
            peeked: None,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Token<'src> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.unwrap()
    }

    fn bump(&mut self) -> Token<'src> {
        let tok = self.peek();
        self.peeked = None;
        tok
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.bump();
        }
    }

    /// Skip to (not past) the next newline, for statement-level recovery.
    fn skip_to_eol(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Newline | TokenKind::Eof | TokenKind::RBrace => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn error(&mut self, kind: ParseErrorKind, tok: Token<'src>) {
        trace!("parse error {:?} at {}", kind, tok.start);
        self.errors
            .push(ParseError::new(kind, Span::new(tok.start.byte, tok.end.byte)));
    }

    fn range(&self, start: Pos, end: Pos) -> Range {
        Range::new(self.filename, start, end)
    }

    fn token_range(&self, tok: Token<'src>) -> Range {
        self.range(tok.start, tok.end)
    }

    /// Parse statements until `}` (when `root` is false) or EOF.
    fn parse_statements(&mut self, root: bool) -> (Vec<Attribute>, Vec<Block>) {
        let mut attributes = Vec::new();
        let mut blocks = Vec::new();

        loop {
            self.skip_newlines();
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::RBrace => {
                    if root {
                        self.error(
                            ParseErrorKind::UnexpectedToken {
                                got: "}".to_string(),
                                expected: "an attribute or block",
                            },
                            tok,
                        );
                        self.bump();
                        continue;
                    }
                    break;
                }
                TokenKind::Ident => match self.parse_statement() {
                    Some(Statement::Attribute(attr)) => attributes.push(attr),
                    Some(Statement::Block(block)) => blocks.push(block),
                    None => {}
                },
                _ => {
                    self.error(
                        ParseErrorKind::UnexpectedToken {
                            got: tok.text.to_string(),
                            expected: "an attribute or block",
                        },
                        tok,
                    );
                    self.bump();
                    self.skip_to_eol();
                }
            }
        }

        (attributes, blocks)
    }

    /// Parse one statement starting at an identifier. Returns `None`
    /// when the identifier turns out to be dangling (still under
    /// edit); the decoder recovers such prefixes from raw bytes.
    fn parse_statement(&mut self) -> Option<Statement> {
        let name_tok = self.bump();
        debug_assert_eq!(name_tok.kind, TokenKind::Ident);

        match self.peek().kind {
            TokenKind::Equal => {
                self.bump();
                Some(Statement::Attribute(self.parse_attribute(name_tok)))
            }
            TokenKind::Str | TokenKind::Ident | TokenKind::LBrace => {
                self.parse_block(name_tok).map(Statement::Block)
            }
            _ => {
                self.error(
                    ParseErrorKind::DanglingIdentifier {
                        name: name_tok.text.to_string(),
                    },
                    name_tok,
                );
                self.skip_to_eol();
                None
            }
        }
    }

    /// Parse the right-hand side of `name =`.
    fn parse_attribute(&mut self, name_tok: Token<'src>) -> Attribute {
        let expr = if self.at_statement_end() {
            let tok = self.peek();
            self.error(ParseErrorKind::ExpectedExpression, tok);
            let at = self.peek().start;
            Expression {
                kind: ExprKind::Missing,
                range: self.range(at, at),
            }
        } else {
            let expr = self.parse_expression();
            if !self.at_statement_end() {
                let tok = self.peek();
                self.error(
                    ParseErrorKind::UnexpectedToken {
                        got: tok.text.to_string(),
                        expected: "a newline after the expression",
                    },
                    tok,
                );
                self.skip_to_eol();
            }
            expr
        };

        let range = self.range(name_tok.start, expr.range.end);
        Attribute {
            name: name_tok.text.to_string(),
            name_range: self.token_range(name_tok),
            expr: Some(expr),
            range,
        }
    }

    fn at_statement_end(&mut self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Eof | TokenKind::RBrace | TokenKind::Comma
        )
    }

    /// Parse a block: labels, `{`, body, `}`.
    fn parse_block(&mut self, type_tok: Token<'src>) -> Option<Block> {
        let mut labels = Vec::new();
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Str => {
                    self.bump();
                    labels.push(self.string_label(tok));
                }
                TokenKind::Ident => {
                    self.bump();
                    labels.push(BlockLabel {
                        value: tok.text.to_string(),
                        range: self.token_range(tok),
                        value_range: self.token_range(tok),
                    });
                }
                _ => break,
            }
        }

        if self.peek().kind != TokenKind::LBrace {
            // `service "db"` with the brace still to come.
            self.error(
                ParseErrorKind::DanglingIdentifier {
                    name: type_tok.text.to_string(),
                },
                type_tok,
            );
            self.skip_to_eol();
            return None;
        }

        let open = self.bump();
        let (attributes, blocks) = self.parse_statements(false);

        let (close_brace_range, body_end, block_end) = if self.peek().kind == TokenKind::RBrace {
            let close = self.bump();
            (Some(self.token_range(close)), close.start, close.end)
        } else {
            let eof = self.peek().start;
            self.error(
                ParseErrorKind::UnclosedBlock {
                    block_type: type_tok.text.to_string(),
                },
                type_tok,
            );
            (None, eof, eof)
        };

        let body = Body {
            attributes,
            blocks,
            range: self.range(open.end, body_end),
        };

        Some(Block {
            block_type: type_tok.text.to_string(),
            type_range: self.token_range(type_tok),
            labels,
            open_brace_range: self.token_range(open),
            close_brace_range,
            body,
            range: self.range(type_tok.start, block_end),
        })
    }

    /// Build a label from a quoted string token.
    fn string_label(&self, tok: Token<'src>) -> BlockLabel {
        let (value, _) = unquote(tok.text);
        let terminated = tok.text.len() >= 2 && tok.text.ends_with('"');
        let inner_start = Pos {
            line: tok.start.line,
            column: tok.start.column + 1,
            byte: tok.start.byte + 1,
        };
        let inner_end = if terminated {
            Pos {
                line: tok.end.line,
                column: tok.end.column - 1,
                byte: tok.end.byte - 1,
            }
        } else {
            tok.end
        };
        BlockLabel {
            value,
            range: self.token_range(tok),
            value_range: self.range(inner_start, inner_end),
        }
    }

    // === Expressions ===

    fn parse_expression(&mut self) -> Expression {
        let cond = self.parse_binary(0);
        if self.peek().kind != TokenKind::Question {
            return cond;
        }
        self.bump();
        let then = self.parse_expression();
        if self.peek().kind == TokenKind::Colon {
            self.bump();
        } else {
            let tok = self.peek();
            self.error(
                ParseErrorKind::UnexpectedToken {
                    got: tok.text.to_string(),
                    expected: "':' in conditional",
                },
                tok,
            );
        }
        let otherwise = self.parse_expression();
        let range = self.range(cond.range.start, otherwise.range.end);
        Expression {
            kind: ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            range,
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> Expression {
        let mut lhs = self.parse_unary();
        loop {
            let Some((op, prec)) = binary_op(self.peek().kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.parse_binary(prec + 1);
            let range = self.range(lhs.range.start, rhs.range.end);
            lhs = Expression {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                range,
            };
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expression {
        let tok = self.peek();
        let op = match tok.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary();
            let range = self.range(tok.start, operand.range.end);
            return Expression {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                range,
            };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expression {
        let mut expr = self.parse_primary();
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    let dot = self.bump();
                    let ExprKind::Traversal(ref mut steps) = expr.kind else {
                        // `.x` on a non-traversal is out of the engine's
                        // interpretation floor; leave the dot consumed.
                        break;
                    };
                    if self.peek().kind == TokenKind::Ident {
                        let name = self.bump();
                        steps.push(TravStep {
                            kind: TravStepKind::Attr(name.text.to_string()),
                            range: self.range(dot.start, name.end),
                        });
                        expr.range.end = name.end;
                    } else {
                        // `root.` with the attribute still to come.
                        steps.push(TravStep {
                            kind: TravStepKind::Attr(String::new()),
                            range: self.range(dot.start, dot.end),
                        });
                        expr.range.end = dot.end;
                        break;
                    }
                }
                TokenKind::LBracket if matches!(expr.kind, ExprKind::Traversal(_)) => {
                    let open = self.bump();
                    let index = self.parse_expression();
                    let end = if self.peek().kind == TokenKind::RBracket {
                        self.bump().end
                    } else {
                        self.error(
                            ParseErrorKind::UnclosedDelimiter { expected: "']'" },
                            open,
                        );
                        index.range.end
                    };
                    let ExprKind::Traversal(ref mut steps) = expr.kind else {
                        unreachable!()
                    };
                    steps.push(TravStep {
                        kind: TravStepKind::Index(Box::new(index)),
                        range: self.range(open.start, end),
                    });
                    expr.range.end = end;
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expression {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Number => {
                self.bump();
                let kind = match tok.text.parse::<f64>() {
                    Ok(n) => ExprKind::Number(n),
                    Err(_) => ExprKind::Invalid,
                };
                Expression {
                    kind,
                    range: self.token_range(tok),
                }
            }
            TokenKind::Str => {
                self.bump();
                let (value, has_interpolation) = unquote(tok.text);
                Expression {
                    kind: ExprKind::String {
                        value,
                        has_interpolation,
                    },
                    range: self.token_range(tok),
                }
            }
            TokenKind::Heredoc => {
                self.bump();
                self.heredoc_expr(tok)
            }
            TokenKind::Ident => {
                self.bump();
                match tok.text {
                    "true" => Expression {
                        kind: ExprKind::Bool(true),
                        range: self.token_range(tok),
                    },
                    "false" => Expression {
                        kind: ExprKind::Bool(false),
                        range: self.token_range(tok),
                    },
                    "null" => Expression {
                        kind: ExprKind::Null,
                        range: self.token_range(tok),
                    },
                    _ if self.peek().kind == TokenKind::LParen => self.function_call(tok),
                    _ => Expression {
                        kind: ExprKind::Traversal(vec![TravStep {
                            kind: TravStepKind::Root(tok.text.to_string()),
                            range: self.token_range(tok),
                        }]),
                        range: self.token_range(tok),
                    },
                }
            }
            TokenKind::LBracket => self.tuple_or_for(tok),
            TokenKind::LBrace => self.object_or_for(tok),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression();
                let end = if self.peek().kind == TokenKind::RParen {
                    self.bump().end
                } else {
                    self.error(ParseErrorKind::UnclosedDelimiter { expected: "')'" }, tok);
                    inner.range.end
                };
                let range = self.range(tok.start, end);
                Expression {
                    kind: ExprKind::Paren(Box::new(inner)),
                    range,
                }
            }
            _ => {
                self.error(
                    ParseErrorKind::UnexpectedToken {
                        got: tok.text.to_string(),
                        expected: "an expression",
                    },
                    tok,
                );
                self.bump();
                Expression {
                    kind: ExprKind::Invalid,
                    range: self.token_range(tok),
                }
            }
        }
    }

    fn function_call(&mut self, name_tok: Token<'src>) -> Expression {
        let open = self.bump();
        debug_assert_eq!(open.kind, TokenKind::LParen);
        let mut args = Vec::new();
        let end;
        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::RParen => {
                    end = self.bump().end;
                    break;
                }
                TokenKind::Eof => {
                    self.error(
                        ParseErrorKind::UnclosedDelimiter { expected: "')'" },
                        name_tok,
                    );
                    end = self.peek().start;
                    break;
                }
                TokenKind::Comma => {
                    self.bump();
                }
                _ => args.push(self.parse_expression()),
            }
        }
        Expression {
            kind: ExprKind::FunctionCall {
                name: name_tok.text.to_string(),
                name_range: self.token_range(name_tok),
                args,
            },
            range: self.range(name_tok.start, end),
        }
    }

    fn tuple_or_for(&mut self, open: Token<'src>) -> Expression {
        self.bump();
        self.skip_newlines();
        if self.at_for_keyword() {
            return self.for_expr(open, TokenKind::RBracket);
        }

        let mut items = Vec::new();
        let end;
        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::RBracket => {
                    end = self.bump().end;
                    break;
                }
                TokenKind::Eof | TokenKind::RBrace => {
                    self.error(ParseErrorKind::UnclosedDelimiter { expected: "']'" }, open);
                    end = self.peek().start;
                    break;
                }
                TokenKind::Comma => {
                    self.bump();
                }
                _ => items.push(self.parse_expression()),
            }
        }
        Expression {
            kind: ExprKind::Tuple(items),
            range: self.range(open.start, end),
        }
    }

    fn object_or_for(&mut self, open: Token<'src>) -> Expression {
        self.bump();
        self.skip_newlines();
        if self.at_for_keyword() {
            return self.for_expr(open, TokenKind::RBrace);
        }

        let mut items = Vec::new();
        let end;
        loop {
            self.skip_newlines();
            let tok = self.peek();
            match tok.kind {
                TokenKind::RBrace => {
                    end = self.bump().end;
                    break;
                }
                TokenKind::Eof => {
                    self.error(ParseErrorKind::UnclosedDelimiter { expected: "'}'" }, open);
                    end = tok.start;
                    break;
                }
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::Ident | TokenKind::Str => {
                    self.bump();
                    items.push(self.object_item(tok));
                }
                _ => {
                    self.error(
                        ParseErrorKind::UnexpectedToken {
                            got: tok.text.to_string(),
                            expected: "an object key",
                        },
                        tok,
                    );
                    self.bump();
                }
            }
        }
        Expression {
            kind: ExprKind::Object(items),
            range: self.range(open.start, end),
        }
    }

    fn object_item(&mut self, key_tok: Token<'src>) -> ObjectItem {
        let key = if key_tok.kind == TokenKind::Str {
            unquote(key_tok.text).0
        } else {
            key_tok.text.to_string()
        };
        let key_range = self.token_range(key_tok);

        if matches!(self.peek().kind, TokenKind::Equal | TokenKind::Colon) {
            self.bump();
        }
        let value = if matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Comma | TokenKind::RBrace | TokenKind::Eof
        ) {
            let at = self.peek().start;
            Some(Expression {
                kind: ExprKind::Missing,
                range: self.range(at, at),
            })
        } else {
            Some(self.parse_expression())
        };

        let end = value.as_ref().map(|v| v.range.end).unwrap_or(key_range.end);
        ObjectItem {
            key,
            key_range: key_range.clone(),
            value,
            range: self.range(key_range.start, end),
        }
    }

    fn at_for_keyword(&mut self) -> bool {
        let tok = self.peek();
        tok.kind == TokenKind::Ident && tok.text == "for"
    }

    /// `for k, v in coll : expr [if cond]` up to `closer`.
    fn for_expr(&mut self, open: Token<'src>, closer: TokenKind) -> Expression {
        self.bump(); // for

        let mut key_var = None;
        let mut value_var = String::new();
        if self.peek().kind == TokenKind::Ident {
            value_var = self.bump().text.to_string();
        }
        if self.peek().kind == TokenKind::Comma {
            self.bump();
            if self.peek().kind == TokenKind::Ident {
                key_var = Some(std::mem::replace(
                    &mut value_var,
                    self.bump().text.to_string(),
                ));
            }
        }
        // `in`
        if self.peek().kind == TokenKind::Ident && self.peek().text == "in" {
            self.bump();
        }
        let collection = self.parse_expression();
        if self.peek().kind == TokenKind::Colon {
            self.bump();
        }
        let first = self.parse_expression();
        let (key_expr, value_expr) = if self.peek().kind == TokenKind::FatArrow {
            self.bump();
            (Some(first), self.parse_expression())
        } else {
            (None, first)
        };
        let cond = if self.peek().kind == TokenKind::Ident && self.peek().text == "if" {
            self.bump();
            Some(self.parse_expression())
        } else {
            None
        };

        let end = if self.peek().kind == closer {
            self.bump().end
        } else {
            self.error(
                ParseErrorKind::UnclosedDelimiter {
                    expected: if closer == TokenKind::RBracket {
                        "']'"
                    } else {
                        "'}'"
                    },
                },
                open,
            );
            self.peek().start
        };

        Expression {
            kind: ExprKind::ForExpr(Box::new(ForExpr {
                key_var,
                value_var,
                collection,
                key_expr,
                value_expr,
                cond,
            })),
            range: self.range(open.start, end),
        }
    }

    fn heredoc_expr(&self, tok: Token<'src>) -> Expression {
        // Token text: `<<DELIM\n...lines...\nDELIM` (possibly truncated
        // at EOF). Recover delimiter and content from the text.
        let text = tok.text;
        let after_marker = text.trim_start_matches('<').trim_start_matches('-');
        let delimiter: String = after_marker
            .chars()
            .take_while(|c| crate::is_ident_char(*c))
            .collect();

        let content_start_byte = match text.find('\n') {
            Some(i) => tok.start.byte + i as u32 + 1,
            None => tok.end.byte,
        };
        // Content ends at the start of the line holding the delimiter.
        let content_end_byte = if text.ends_with(&delimiter) && content_start_byte < tok.end.byte {
            let tail_start = text.len() - delimiter.len();
            let line_start = text[..tail_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            tok.start.byte + line_start as u32
        } else {
            tok.end.byte
        };

        let value = self.source[content_start_byte as usize..content_end_byte as usize].to_string();
        let content_range = self.range(
            crate::span::pos_at_byte(self.source, content_start_byte),
            crate::span::pos_at_byte(self.source, content_end_byte),
        );

        Expression {
            kind: ExprKind::Heredoc {
                delimiter,
                value,
                content_range,
            },
            range: self.token_range(tok),
        }
    }
}

enum Statement {
    Attribute(Attribute),
    Block(Block),
}

fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::NotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::LtEq => (BinaryOp::LtEq, 4),
        TokenKind::GtEq => (BinaryOp::GtEq, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    })
}

/// Strip quotes and process escapes. Returns the value and whether the
/// string contains `${` template interpolation.
fn unquote(text: &str) -> (String, bool) {
    let inner = text
        .strip_prefix('"')
        .unwrap_or(text)
        .strip_suffix('"')
        .unwrap_or_else(|| text.strip_prefix('"').unwrap_or(text));

    let mut out = String::with_capacity(inner.len());
    let mut has_interpolation = false;
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '$' if chars.peek() == Some(&'{') => {
                has_interpolation = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    (out, has_interpolation)
}
