#[cfg(test)]
mod parser_tests {
    use nyx::ast::Stmt;
    use nyx::ast_printer::AstPrinter;
    use nyx::error::NyxError;
    use nyx::parser::{Parser, MAX_ARITY};
    use nyx::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<NyxError>) {
        let (tokens, lex_errors) = Scanner::new("test.nyx", source).scan_all();
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);

        Parser::new(&tokens).parse()
    }

    /// Parse without errors and print every statement.
    fn printed(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        let (_, errors) = parse(source);
        errors.iter().map(|e| e.message()).collect()
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(printed("1 + 2 * 3;"), ["(; (+ 1 (* 2 3)))"]);
        assert_eq!(printed("(1 + 2) * 3;"), ["(; (* (group (+ 1 2)) 3))"]);
        assert_eq!(printed("-a == !b;"), ["(; (== (- a) (! b)))"]);
        assert_eq!(
            printed("a or b and c;"),
            ["(; (or a (and b c)))"]
        );
        assert_eq!(printed("1 < 2 == true;"), ["(; (== (< 1 2) true))"]);
    }

    #[test]
    fn test_semicolons_are_optional() {
        assert_eq!(
            printed("let a = 1 let b = \"two\"\na + b"),
            ["(let a 1)", "(let b \"two\")", "(; (+ a b))"]
        );
    }

    #[test]
    fn test_for_is_desugared_to_while() {
        assert_eq!(
            printed("for (let i = 0; i < 3; i += 1) print(i);"),
            ["(block (let i 0) (while (< i 3) (block (; (call print i)) (; (+= i 1)))))"]
        );

        assert_eq!(printed("for (;;) x;"), ["(while true (; x))"]);
    }

    #[test]
    fn test_assignment_targets() {
        assert_eq!(printed("a = b = 1;"), ["(; (= a (= b 1)))"]);
        assert_eq!(printed("a.b.c *= 3;"), ["(; (*= (. (. a b) c) 3))"]);

        assert_eq!(error_messages("1 = 2;"), ["Invalid assignment target."]);
        assert_eq!(error_messages("a + b = 2;"), ["Invalid assignment target."]);
    }

    #[test]
    fn test_functions_and_lambdas() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            ["(fun add (a b) (block (return (+ a b))))"]
        );
        assert_eq!(
            printed("let f = fun () { return }"),
            ["(let f (fun () (block (return))))"]
        );
        assert_eq!(
            printed("f(1)(2, 3);"),
            ["(; (call (call f 1) 2 3))"]
        );
    }

    #[test]
    fn test_class_with_superclass() {
        assert_eq!(
            printed("class B(A) { init() { super.init(); this.x = 1; } }"),
            ["(class B < A (method init () (block (; (call (super init))) (; (= (. this x) 1)))))"]
        );
    }

    #[test]
    fn test_import_path() {
        assert_eq!(printed("import a.b.c;"), ["(import a.b.c)"]);
        assert_eq!(
            error_messages("import a.;"),
            ["Expected module name."]
        );
    }

    #[test]
    fn test_parameter_limit() {
        let params: Vec<String> = (0..=MAX_ARITY).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        assert_eq!(
            error_messages(&source),
            ["Can't have more than 127 parameters."]
        );

        let ok: Vec<String> = (0..MAX_ARITY).map(|i| format!("p{}", i)).collect();
        let (_, errors) = parse(&format!("fun f({}) {{}}", ok.join(", ")));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_argument_limit() {
        let args: Vec<String> = (0..=MAX_ARITY).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        assert_eq!(
            error_messages(&source),
            ["Can't have more than 127 arguments."]
        );
    }

    #[test]
    fn test_recovers_after_error() {
        let (statements, errors) = parse("let = 1; let b = 2; print(b);");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Expected variable name.");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_recovers_inside_function_body() {
        let (statements, errors) = parse("fun f() {\n let x = ;\n print(x);\n}\nprint(1);");

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].message(), "Expected expression.");
        assert_eq!(errors[0].location().map(|(_, line, _)| line), Some(2));

        let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
        assert_eq!(
            printed,
            ["(fun f () (block (; (call print x))))", "(; (call print 1))"]
        );
    }

    #[test]
    fn test_recovers_inside_block_and_class_body() {
        let (statements, errors) = parse("{ let x = 1 + }\nprint(2);");

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].message(), "Expected expression.");
        assert_eq!(statements.len(), 2);

        let (statements, errors) = parse(
            "class A {\n m() { let = 1; }\n n() { return 2; }\n}\nprint(A);",
        );

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(errors[0].message(), "Expected variable name.");

        let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
        assert_eq!(
            printed,
            [
                "(class A (method m () (block)) (method n () (block (return 2))))",
                "(; (call print A))",
            ]
        );
    }

    #[test]
    fn test_missing_expression_reports_location() {
        let (_, errors) = parse("let a = ;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Expected expression.");
        assert_eq!(errors[0].location(), Some(("test.nyx", 1, 9)));
    }

    #[test]
    fn test_parse_expression() {
        let (tokens, _) = Scanner::new("test.nyx", "1 + 2").scan_all();
        let expr = Parser::new(&tokens).parse_expression().expect("expression parses");

        assert_eq!(AstPrinter::print(&expr), "(+ 1 2)");

        let (tokens, _) = Scanner::new("test.nyx", "1 + 2 3").scan_all();
        assert!(Parser::new(&tokens).parse_expression().is_err());
    }
}
