use std::fmt;

/// A lexical token with its source position.
///
/// `position` is the zero-based character offset of the token's first
/// character. `text` carries the payload: the unescaped body of a string
/// literal (delimiters stripped), the source text of a number, the name of an
/// identifier, or the operator spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Token::new(TokenKind::Eof, "", position)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::String => write!(f, "string \"{}\"", self.text),
            TokenKind::Number => write!(f, "number {}", self.text),
            TokenKind::Identifier => write!(f, "identifier `{}`", self.text),
            _ => write!(f, "`{}`", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// String literal enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// "John"
    /// 'it\'s'
    /// ```
    String,

    /// Integer or floating-point number, kept as source text so the binder
    /// can parse it into the member's exact numeric type
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -3.5
    /// 1e6
    /// ```
    Number,

    /// `true`
    True,

    /// `false`
    False,

    /// `null`
    Null,

    /// Member name segment
    ///
    /// Must start with letter or underscore, followed by letters, digits, or
    /// underscores. Dotted paths are assembled by the parser.
    Identifier,

    // Comparison
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,

    // Logical
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `.`
    Dot,

    /// End of input
    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::String => "string literal",
            TokenKind::Number => "number",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Null => "`null`",
            TokenKind::Identifier => "member name",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Eof => "end of input",
        }
    }
}
