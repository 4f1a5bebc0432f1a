#[cfg(test)]
mod scanner_tests {
    use nyx::error::NyxError;
    use nyx::scanner::*;
    use nyx::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new("test.nyx", source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, NyxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*});",
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
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= += -= *= /= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "let import class classy _x fun this super",
            &[
                (TokenType::LET, "let"),
                (TokenType::IMPORT, "import"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::FUN, "fun"),
                (TokenType::THIS, "this"),
                (TokenType::SUPER, "super"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals_carry_values() {
        let (tokens, errors) = Scanner::new("test.nyx", "12.5 7 \"hi there\"").scan_all();

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 4);

        match &tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 12.5),
            other => panic!("expected number, got {:?}", other),
        }
        match &tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 7.0),
            other => panic!("expected number, got {:?}", other),
        }
        match &tokens[2].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi there"),
            other => panic!("expected string, got {:?}", other),
        }
        assert_eq!(tokens[2].lexeme, "\"hi there\"");
    }

    #[test]
    fn test_scanner_05_trailing_dot_is_not_fraction() {
        assert_token_sequence(
            "1.foo",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_token_sequence(
            "a // the rest is ignored ( { \nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = Scanner::new("pos.nyx", "let x\n  = \"a\nb\" y").scan_all();

        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();

        // `let` `x` on line 1, `=` at 2:3, the string starts at 2:5 and spans
        // into line 3, `y` follows on line 3.
        assert_eq!(positions[0], (1, 1));
        assert_eq!(positions[1], (1, 5));
        assert_eq!(positions[2], (2, 3));
        assert_eq!(positions[3], (2, 5));
        assert_eq!(positions[4], (3, 4));
        assert_eq!(&*tokens[4].file, "pos.nyx");
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new("test.nyx", source);

        let results: Vec<_> = scanner.collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<&NyxError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 2, "Expected 2 error messages");

        assert_eq!(errors[0].message(), "Unexpected character '$'.");
        assert_eq!(errors[1].message(), "Unexpected character '#'.");
        assert_eq!(errors[0].location(), Some(("test.nyx", 1, 3)));
    }

    #[test]
    fn test_multibyte_character_is_one_error() {
        let (tokens, errors) = Scanner::new("test.nyx", "a é b").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unexpected character 'é'.");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = Scanner::new("test.nyx", "\"never closed").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unterminated string.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn test_exactly_one_eof() {
        let mut scanner = Scanner::new("test.nyx", "");

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_display() {
        let (tokens, _) = Scanner::new("test.nyx", "3 \"s\" x").scan_all();

        assert_eq!(tokens[0].to_string(), "NUMBER 3 3");
        assert_eq!(tokens[1].to_string(), "STRING \"s\" s");
        assert_eq!(tokens[2].to_string(), "IDENTIFIER x nil");
    }
}
