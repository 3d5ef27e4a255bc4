// tests/lexer_tests.rs

use sieve::ast::{Token, TokenKind};
use sieve::lexer::{LexError, Lexer, tokenize};

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
}

// ============================================================================
// Operators and Punctuation
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("!", TokenKind::Bang),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        (",", TokenKind::Comma),
        (".", TokenKind::Dot),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("<=", TokenKind::LtEq),
        (">=", TokenKind::GtEq),
        ("&&", TokenKind::AndAnd),
        ("||", TokenKind::OrOr),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(token.text, input);
    }
}

#[test]
fn test_lone_operator_halves_are_rejected() {
    for (input, ch) in [("=", '='), ("&", '&'), ("|", '|'), ("Age = 3", '=')] {
        let err = tokenize(input).unwrap_err();
        assert!(
            matches!(err, LexError::UnexpectedChar { ch: c, .. } if c == ch),
            "Failed for input: {} ({:?})",
            input,
            err
        );
    }
}

#[test]
fn test_identifiers_are_ascii_only() {
    for (input, ch) in [("Näme == 1", 'ä'), ("élan", 'é'), ("Age_2 > Ω", 'Ω')] {
        let err = tokenize(input).unwrap_err();
        assert!(
            matches!(err, LexError::UnexpectedChar { ch: c, .. } if c == ch),
            "Failed for input: {} ({:?})",
            input,
            err
        );
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    let test_cases = vec![
        ("42", "42"),
        ("-7", "-7"),
        ("3.25", "3.25"),
        ("1e3", "1e3"),
        ("2.5E-4", "2.5E-4"),
    ];

    for (input, expected) in test_cases {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number, "Failed for input: {}", input);
        assert_eq!(tokens[0].text, expected);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }
}

#[test]
fn test_number_followed_by_dot_member() {
    // `1.` without a digit after it is not a fraction
    assert_eq!(
        kinds("1.x"),
        vec![TokenKind::Number, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn test_strings_with_either_quote() {
    for input in ["'John'", "\"John\""] {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "John");
    }
}

#[test]
fn test_string_escapes() {
    let tokens = tokenize(r#""a\"b\\c\n\t\r\'""#).unwrap();
    assert_eq!(tokens[0].text, "a\"b\\c\n\t\r'");
}

#[test]
fn test_invalid_escape() {
    let err = tokenize(r#"Name == "a\qb""#).unwrap_err();
    assert_eq!(err, LexError::InvalidEscape { position: 10, ch: 'q' });
}

#[test]
fn test_unterminated_string() {
    let err = tokenize(r#"Name == "unterminated"#).unwrap_err();
    assert_eq!(err, LexError::UnterminatedString { position: 8 });
    assert_eq!(err.position(), Some(8));
}

// ============================================================================
// Positions and Whole Filters
// ============================================================================

#[test]
fn test_token_positions() {
    let tokens = tokenize("Age  >= 30").unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 5, 8, 10]);
}

#[test]
fn test_full_filter() {
    assert_eq!(
        kinds("!(Status == 2 || Name != null) && Archived"),
        vec![
            TokenKind::Bang,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::EqEq,
            TokenKind::Number,
            TokenKind::OrOr,
            TokenKind::Identifier,
            TokenKind::NotEq,
            TokenKind::Null,
            TokenKind::RParen,
            TokenKind::AndAnd,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_whitespace_is_insignificant() {
    assert_eq!(kinds("Age>30"), kinds("  Age \n>\t30  "));
}

#[test]
fn test_input_limit() {
    let limits = sieve::Limits {
        max_input_len: 8,
        ..Default::default()
    };
    let err = sieve::lexer::tokenize_with("Name == 'abcdef'", &limits).unwrap_err();
    assert_eq!(err, LexError::InputTooLong { len: 16, max: 8 });
}

#[test]
fn test_token_display() {
    assert_eq!(Token::new(TokenKind::String, "x", 0).to_string(), "string \"x\"");
    assert_eq!(Token::eof(3).to_string(), "end of input");
}
