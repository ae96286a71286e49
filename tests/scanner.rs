use loxide::scanner::Scanner;
use loxide::token::TokenType;

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn one_and_two_character_operators() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "class klass fun funny var variable super this",
        &[
            (TokenType::CLASS, "class"),
            (TokenType::IDENTIFIER, "klass"),
            (TokenType::FUN, "fun"),
            (TokenType::IDENTIFIER, "funny"),
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "variable"),
            (TokenType::SUPER, "super"),
            (TokenType::THIS, "this"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn string_literal_carries_contents_without_quotes() {
    let tokens: Vec<_> = Scanner::new(b"\"hello world\"")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");
    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn number_literals() {
    let tokens: Vec<_> = Scanner::new(b"123 3.14").filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 3);
    match tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 123.0),
        _ => panic!("expected NUMBER"),
    }
    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 3.14),
        _ => panic!("expected NUMBER"),
    }
}

#[test]
fn dot_after_number_is_not_a_fraction() {
    // "123." is NUMBER then DOT, since no digit follows the dot
    assert_token_sequence(
        "123.abs",
        &[
            (TokenType::NUMBER(123.0), "123"),
            (TokenType::DOT, "."),
            (TokenType::IDENTIFIER, "abs"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn comments_and_whitespace_are_discarded() {
    assert_token_sequence(
        "var x; // this is a comment\nprint x;",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::PRINT, "print"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn newlines_increment_the_line_counter() {
    let tokens: Vec<_> = Scanner::new(b"a\nb\n\nc").filter_map(Result::ok).collect();

    let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 2, 4, 4]); // c and EOF on line 4
}

#[test]
fn scanning_continues_past_unexpected_characters() {
    let results: Vec<_> = Scanner::new(b",.$(#").collect();

    // COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2, "both bad characters should be reported");

    let tokens: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(tokens[0].token_type, TokenType::COMMA);
    assert_eq!(tokens[1].token_type, TokenType::DOT);
    assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
    assert_eq!(tokens[3].token_type, TokenType::EOF);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "got: {}",
            err
        );
    }
}

#[test]
fn unterminated_string_is_an_error() {
    let results: Vec<_> = Scanner::new(b"\"abc").collect();

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .map(|e| e.to_string())
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Unterminated string."));
}

#[test]
fn exactly_one_eof_even_when_pulled_past_the_end() {
    let mut scanner = Scanner::new(b"1;");

    let mut eof_count = 0;
    for result in &mut scanner {
        if let Ok(tok) = result {
            if tok.token_type == TokenType::EOF {
                eof_count += 1;
            }
        }
    }
    assert_eq!(eof_count, 1);
    assert!(scanner.next().is_none(), "scanner is fused");
}
