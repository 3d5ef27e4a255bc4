use thiserror::Error;

use crate::ast::{Token, TokenKind};
use crate::config::Limits;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { position: usize, ch: char },
    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },
    #[error("invalid escape sequence '\\{ch}' at position {position}")]
    InvalidEscape { position: usize, ch: char },
    #[error("input of {len} characters exceeds the limit of {max}")]
    InputTooLong { len: usize, max: usize },
}

impl LexError {
    pub fn position(&self) -> Option<usize> {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. } => Some(*position),
            LexError::InputTooLong { .. } => None,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(LexError::InvalidEscape {
                                position: self.position - 1,
                                ch,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();
        let mut is_float = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Exponent only when digits follow, so `1e` stays a number then a name
        if matches!(self.current_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    number.push(self.current_char().unwrap_or('e'));
                    self.advance();
                }
                while let Some(ch) = self.current_char() {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    number.push(ch);
                    self.advance();
                }
            }
        }

        number
    }

    fn two_char(&mut self, kind: TokenKind, text: &str) -> Token {
        let start = self.position;
        self.advance();
        self.advance();
        Token::new(kind, text, start)
    }

    fn one_char(&mut self, kind: TokenKind, text: &str) -> Token {
        let start = self.position;
        self.advance();
        Token::new(kind, text, start)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        let token = match self.current_char() {
            None => Token::eof(start),
            Some('=') if self.peek_char(1) == Some('=') => self.two_char(TokenKind::EqEq, "=="),
            Some('!') if self.peek_char(1) == Some('=') => self.two_char(TokenKind::NotEq, "!="),
            Some('>') if self.peek_char(1) == Some('=') => self.two_char(TokenKind::GtEq, ">="),
            Some('<') if self.peek_char(1) == Some('=') => self.two_char(TokenKind::LtEq, "<="),
            Some('&') if self.peek_char(1) == Some('&') => self.two_char(TokenKind::AndAnd, "&&"),
            Some('|') if self.peek_char(1) == Some('|') => self.two_char(TokenKind::OrOr, "||"),
            Some('!') => self.one_char(TokenKind::Bang, "!"),
            Some('>') => self.one_char(TokenKind::Gt, ">"),
            Some('<') => self.one_char(TokenKind::Lt, "<"),
            Some('(') => self.one_char(TokenKind::LParen, "("),
            Some(')') => self.one_char(TokenKind::RParen, ")"),
            Some(',') => self.one_char(TokenKind::Comma, ","),
            Some('.') => self.one_char(TokenKind::Dot, "."),
            Some(quote @ ('"' | '\'')) => {
                let body = self.read_string(quote)?;
                Token::new(TokenKind::String, body, start)
            }
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                Token::new(TokenKind::Number, self.read_number(), start)
            }
            Some(ch) if ch.is_ascii_digit() => {
                Token::new(TokenKind::Number, self.read_number(), start)
            }
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                let kind = match ident.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    _ => TokenKind::Identifier,
                };
                Token::new(kind, ident, start)
            }
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    position: start,
                    ch,
                });
            }
        };

        Ok(token)
    }
}

/// Lex the whole input, ending with an `Eof` token.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    tokenize_with(text, &Limits::default())
}

pub fn tokenize_with(text: &str, limits: &Limits) -> Result<Vec<Token>, LexError> {
    let len = text.chars().count();
    if len > limits.max_input_len {
        return Err(LexError::InputTooLong {
            len,
            max: limits.max_input_len,
        });
    }

    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.is(TokenKind::Eof);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null truth");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::True);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::False);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Null);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_member_chain() {
    let kinds: Vec<TokenKind> = tokenize("Address.City != 'Oslo'")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::NotEq,
            TokenKind::String,
            TokenKind::Eof,
        ]
    );
}
