use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Literal, MemberPath, Token, TokenKind, UnaryOp},
    config::Limits,
    error::Error,
    lexer,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} at position {position}, found {found}")]
    Unexpected {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("expression nesting exceeds {max} levels at position {position}")]
    TooDeep { position: usize, max: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Unexpected { position, .. } | ParseError::TooDeep { position, .. } => {
                *position
            }
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser::with_limits(tokens, &Limits::default())
    }

    pub fn with_limits(mut tokens: Vec<Token>, limits: &Limits) -> Self {
        // The grammar relies on a trailing Eof; supply one for hand-built streams
        if !tokens.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            let end = tokens.last().map_or(0, |t| t.position + t.text.chars().count());
            tokens.push(Token::eof(end));
        }
        Parser {
            tokens,
            index: 0,
            depth: 0,
            max_depth: limits.max_depth,
        }
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.index.min(last)]
    }

    fn advance(&mut self) {
        if !self.current().is(TokenKind::Eof) {
            self.index += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError::Unexpected {
            position: token.position,
            expected: expected.into(),
            found: token.to_string(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(self.unexpected(kind.describe()));
        }
        let token = self.current().clone();
        self.advance();
        Ok(token)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                position: self.current().position,
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse a complete filter; anything after the expression is an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected("`&&`, `||` or end of input"));
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        let mut levels = 0;

        while self.check(TokenKind::OrOr) {
            // Each connective nests the chain built so far one level deeper
            self.enter()?;
            levels += 1;
            self.advance();
            let right = self.parse_and()?;
            left = Expr::binary(BinOp::Or, left, right);
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;

        while self.check(TokenKind::AndAnd) {
            // Each connective nests the chain built so far one level deeper
            self.enter()?;
            levels += 1;
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(BinOp::And, left, right);
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Bang) {
            self.enter()?;
            self.advance();
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind {
            TokenKind::LParen => {
                self.enter()?;
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                Ok(expr)
            }
            TokenKind::Identifier => {
                let path = self.parse_member_path()?;
                let op = match self.current().kind {
                    TokenKind::EqEq => BinOp::Equal,
                    TokenKind::NotEq => BinOp::NotEqual,
                    TokenKind::Lt => BinOp::LessThan,
                    TokenKind::Gt => BinOp::GreaterThan,
                    TokenKind::LtEq => BinOp::LessEqual,
                    TokenKind::GtEq => BinOp::GreaterEqual,
                    // Bare member: a boolean test, checked by the binder
                    _ => return Ok(Expr::Member(path)),
                };
                self.advance();
                let literal = self.parse_literal()?;
                Ok(Expr::binary(op, Expr::Member(path), Expr::Literal(literal)))
            }
            _ => Err(self.unexpected("member name, `!` or `(`")),
        }
    }

    fn parse_member_path(&mut self) -> Result<MemberPath, ParseError> {
        let mut segments = vec![self.expect(TokenKind::Identifier)?.text];
        while self.check(TokenKind::Dot) {
            self.advance();
            segments.push(self.expect(TokenKind::Identifier)?.text);
        }
        Ok(MemberPath { segments })
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.current().kind {
            TokenKind::String => Literal::String(self.current().text.clone()),
            TokenKind::Number => Literal::Number(self.current().text.clone()),
            TokenKind::True => Literal::Boolean(true),
            TokenKind::False => Literal::Boolean(false),
            TokenKind::Null => Literal::Null,
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(literal)
    }
}

/// Lex and parse a filter with default limits.
///
/// ```
/// use sieve::ast::{BinOp, Expr};
///
/// let expr = sieve::parse("Name == 'John' && Age > 30").unwrap();
/// assert!(matches!(expr, Expr::Binary { op: BinOp::And, .. }));
/// ```
pub fn parse(text: &str) -> Result<Expr, Error> {
    parse_with(text, &Limits::default())
}

pub fn parse_with(text: &str, limits: &Limits) -> Result<Expr, Error> {
    let tokens = lexer::tokenize_with(text, limits)?;
    let expr = Parser::with_limits(tokens, limits).parse()?;
    tracing::debug!(filter = text, "parsed filter");
    Ok(expr)
}
