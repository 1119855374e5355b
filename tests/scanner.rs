#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;
    use rox::diagnostics::Diagnostics;
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let actual: Vec<(TokenType, &str)> = tokens
            .iter()
            .map(|t| (t.token_type, t.lexeme.as_str()))
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_scanner_01_symbols() {
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
    fn test_two_char_operators() {
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
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "class fun _under orchid or var1 super this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::IDENTIFIER, "var1"),
                (TokenType::SUPER, "super"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_token_sequence(
            "a // ignored ( } \"\nb / c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::SLASH, "/"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_number_literals() {
        let tokens: Vec<Token> = Scanner::new("123 4.5 6. .7").filter_map(Result::ok).collect();

        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::NUMBER,
                TokenType::NUMBER,
                TokenType::NUMBER,
                TokenType::DOT,
                TokenType::DOT,
                TokenType::NUMBER,
                TokenType::EOF,
            ]
        );

        assert_eq!(tokens[0].literal, Some(LiteralValue::Number(123.0)));
        assert_eq!(tokens[1].literal, Some(LiteralValue::Number(4.5)));
        assert_eq!(tokens[2].lexeme, "6");
        assert_eq!(tokens[5].lexeme, "7");
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let tokens: Vec<Token> = Scanner::new("\"one\ntwo\"\nx").filter_map(Result::ok).collect();

        assert_eq!(tokens[0].token_type, TokenType::STRING);
        assert_eq!(tokens[0].literal, Some(LiteralValue::Str("one\ntwo".into())));
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string_reports_and_still_ends_in_eof() {
        let results: Vec<_> = Scanner::new("print \"oops").collect();

        assert_eq!(results.len(), 3);
        assert!(matches!(
            &results[1],
            Err(LoxError::Lex { message, .. }) if message == "Unterminated string."
        ));
        assert!(matches!(&results[2], Ok(t) if t.token_type == TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error('$'), LEFT_PAREN, error('#'), EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert!(matches!(&results[0], Ok(t) if t.token_type == TokenType::COMMA));
        assert!(matches!(&results[1], Ok(t) if t.token_type == TokenType::DOT));
        assert!(matches!(&results[3], Ok(t) if t.token_type == TokenType::LEFT_PAREN));
        assert!(matches!(&results[5], Ok(t) if t.token_type == TokenType::EOF));

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character.".to_string(),
                "[line 1] Error: Unexpected character.".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_ascii_character_reported_once() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("a é b", &mut diagnostics);

        assert_eq!(diagnostics.diagnostics().len(), 1);
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_scan_tokens_forwards_errors_and_continues() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("var a = 1;\n@\nprint a;", &mut diagnostics);

        assert!(diagnostics.had_error());
        assert_eq!(
            diagnostics.diagnostics()[0].to_string(),
            "[line 2] Error: Unexpected character."
        );
        assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::EOF));
        assert_eq!(tokens.len(), 9);
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<Token> = Scanner::new("x 42 \"hi\" 1.25").filter_map(Result::ok).collect();
        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            printed,
            vec![
                "IDENTIFIER x null",
                "NUMBER 42 42.0",
                "STRING \"hi\" hi",
                "NUMBER 1.25 1.25",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_lexemes_rescan_to_the_same_tokens() {
        let source = "class A < B { init(x) { this.x = x >= 1.5; } }\n\
                      // comment\n\
                      for (var i = 0; i <= 10; i = i + 1) print \"s p\" + !nil;";

        let first: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
        let joined: String = first
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let second: Vec<Token> = Scanner::new(&joined).filter_map(Result::ok).collect();

        let kinds = |tokens: &[Token]| -> Vec<(TokenType, String)> {
            tokens
                .iter()
                .map(|t| (t.token_type, t.lexeme.clone()))
                .collect()
        };

        assert_eq!(kinds(&first), kinds(&second));
    }
}
