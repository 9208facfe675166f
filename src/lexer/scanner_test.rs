use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("tokenize")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn significant(source: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(source);
    let mut kinds = Vec::new();
    while let Some(token) = scanner.get().expect("get") {
        kinds.push(token.kind);
    }
    kinds
}

fn error(source: &str) -> LexError {
    let mut scanner = Scanner::new(source);
    loop {
        match scanner.scan() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("expected a lex error for {:?}", source),
            Err(e) => return e,
        }
    }
}

macro_rules! ident {
    ($name:expr) => {
        TokenKind::Identifier($name.to_string())
    };
}

#[test]
fn brackets_and_atoms() {
    assert_eq!(
        kinds("[define x 10]"),
        vec![
            TokenKind::SquareOpen,
            ident!("define"),
            TokenKind::Whitespace,
            ident!("x"),
            TokenKind::Whitespace,
            TokenKind::Integer(10),
            TokenKind::SquareClose,
        ]
    );
}

#[test]
fn get_skips_whitespace_and_comments() {
    assert_eq!(
        significant("; a comment\n  42 ; trailing\n"),
        vec![TokenKind::Integer(42)]
    );
}

#[test]
fn positions_are_one_based_and_reset_per_line() {
    let tokens = tokenize("abc\ndef").expect("tokenize");
    assert_eq!(tokens[0].position, Position::new(1, 1));
    assert_eq!(tokens[1].position, Position::new(1, 4));
    assert_eq!(tokens[2].position, Position::new(2, 1));
    assert_eq!(tokens[2].kind, ident!("def"));
}

#[test]
fn hash_keywords() {
    assert_eq!(
        significant("#t #false #nil #-inf"),
        vec![
            TokenKind::Boolean(true),
            TokenKind::Boolean(false),
            TokenKind::Nil,
            TokenKind::Decimal(f64::NEG_INFINITY),
        ]
    );
    match &significant("#nan")[0] {
        TokenKind::Decimal(n) => assert!(n.is_nan()),
        other => panic!("expected a decimal, got {:?}", other),
    }
    assert_eq!(
        error("#wat").kind,
        LexErrorKind::UnknownKeyword("wat".to_string())
    );
}

#[test]
fn numbers_and_identifier_fallback() {
    assert_eq!(significant("-5"), vec![TokenKind::Integer(-5)]);
    assert_eq!(significant("3.25"), vec![TokenKind::Decimal(3.25)]);
    assert_eq!(significant("+"), vec![ident!("+")]);
    // A dot without a following digit keeps the whole run an identifier.
    assert_eq!(significant("1."), vec![ident!("1.")]);
    assert_eq!(significant("12abc"), vec![ident!("12abc")]);
    assert_eq!(significant("1.5km"), vec![ident!("1.5km")]);
}

#[test]
fn integer_overflow_is_invalid() {
    assert_eq!(
        error("99999999999999999999").kind,
        LexErrorKind::InvalidNumber("99999999999999999999".to_string())
    );
}

#[test]
fn string_escapes() {
    assert_eq!(
        significant(r#""a\nb\\c\"d""#),
        vec![TokenKind::String("a\nb\\c\"d".to_string())]
    );
    assert_eq!(error(r#""bad \x""#).kind, LexErrorKind::InvalidEscape('x'));
}

#[test]
fn unclosed_string_is_unfinished() {
    let err = error("\"abc");
    assert_eq!(err.kind, LexErrorKind::UnclosedString);
    assert!(err.is_unfinished());
}

#[test]
fn quoted_identifier() {
    assert_eq!(
        significant("|hello world|"),
        vec![ident!("hello world")]
    );
    assert!(error("|abc").is_unfinished());
}

#[test]
fn forbidden_identifier_character() {
    assert_eq!(
        error("ab#c").kind,
        LexErrorKind::InvalidIdentifier('#')
    );
}

#[test]
fn quote_sigils() {
    assert_eq!(
        significant("`(,a ,@b)"),
        vec![
            TokenKind::Backquote,
            TokenKind::RoundOpen,
            TokenKind::Comma,
            ident!("a"),
            TokenKind::CommaAt,
            ident!("b"),
            TokenKind::RoundClose,
        ]
    );
}

#[test]
fn text_block_with_embedded_expression() {
    assert_eq!(
        significant("{hello [name] !}"),
        vec![
            TokenKind::CurlyOpen,
            TokenKind::TextContent("hello ".to_string()),
            TokenKind::SquareOpen,
            ident!("name"),
            TokenKind::SquareClose,
            TokenKind::TextContent(" !".to_string()),
            TokenKind::CurlyClose,
        ]
    );
}

#[test]
fn text_blank_line_becomes_empty_line_token() {
    assert_eq!(
        significant("{a\n\nb}"),
        vec![
            TokenKind::CurlyOpen,
            TokenKind::TextContent("a".to_string()),
            TokenKind::EmptyLine,
            TokenKind::TextContent("b".to_string()),
            TokenKind::CurlyClose,
        ]
    );
}

#[test]
fn text_newline_after_expression_is_absorbed() {
    assert_eq!(
        significant("{a [x]\nb}"),
        vec![
            TokenKind::CurlyOpen,
            TokenKind::TextContent("a ".to_string()),
            TokenKind::SquareOpen,
            ident!("x"),
            TokenKind::SquareClose,
            TokenKind::TextContent("b".to_string()),
            TokenKind::CurlyClose,
        ]
    );
}

#[test]
fn text_bracket_escapes() {
    assert_eq!(
        significant("{\\{x\\} \\[y\\] a\\b}"),
        vec![
            TokenKind::CurlyOpen,
            TokenKind::TextContent("{x} [y] a\\b".to_string()),
            TokenKind::CurlyClose,
        ]
    );
}

#[test]
fn unclosed_text_is_unfinished() {
    let err = error("{hello");
    assert_eq!(err.kind, LexErrorKind::UnclosedText);
    assert!(err.is_unfinished());
}
