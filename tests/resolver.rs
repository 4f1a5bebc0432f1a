#[cfg(test)]
mod resolver_tests {
    use std::path::PathBuf;

    use nyx::error::{Diagnostics, MemoryReporter, NyxError};
    use nyx::interpreter::Interpreter;
    use nyx::module::{ModuleRegistry, SearchPaths};
    use nyx::natives::Natives;
    use nyx::parser::Parser;
    use nyx::resolver::Resolver;
    use nyx::scanner::Scanner;

    fn interpreter() -> Interpreter {
        Interpreter::with_parts(
            Diagnostics::new(MemoryReporter::new()),
            Natives::standard(),
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        )
    }

    fn resolve(source: &str) -> Vec<NyxError> {
        let (tokens, lex_errors) = Scanner::new("test.nyx", source).scan_all();
        assert!(lex_errors.is_empty());

        let (statements, parse_errors) = Parser::new(&tokens).parse();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {:?}", parse_errors);

        let mut interpreter = interpreter();
        Resolver::new(&mut interpreter).resolve(&statements)
    }

    fn messages(source: &str) -> Vec<String> {
        resolve(source).iter().map(|e| e.message()).collect()
    }

    #[test]
    fn test_self_read_in_initializer() {
        assert_eq!(
            messages("let a = a;"),
            ["Can't read variable in its own initializer."]
        );
        assert_eq!(
            messages("{ let b = 1; { let b = b + 1; } }"),
            ["Can't read variable in its own initializer."]
        );
    }

    #[test]
    fn test_function_body_may_name_its_binding() {
        assert!(messages("let f = fun () { return f; };").is_empty());
        assert!(messages("fun fact(n) { if (n <= 1) return 1; return n * fact(n - 1); }").is_empty());
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        let errors = resolve("class A(A) {}");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "A class can't inherit from itself.");
        assert_eq!(errors[0].location(), Some(("test.nyx", 1, 9)));
        assert!(!errors[0].is_runtime());
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            messages("fun f() { let a = 1; let a = 2; }"),
            ["Already a variable with this name in this scope."]
        );
        assert_eq!(
            messages("fun g(a, a) {}"),
            ["Already a variable with this name in this scope."]
        );

        // Globals are checked at runtime instead.
        assert!(messages("let a = 1; let a = 2;").is_empty());
    }

    #[test]
    fn test_misplaced_return_this_and_super() {
        assert_eq!(messages("return 1;"), ["Can't return from top-level code."]);
        assert_eq!(messages("print(this);"), ["Can't use 'this' outside of a class."]);
        assert_eq!(
            messages("fun f() { return super.x; }"),
            ["Can't use 'super' outside of a class."]
        );
        assert_eq!(
            messages("class A { m() { return super.m(); } }"),
            ["Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_collects_every_error() {
        let errors = messages(
            r#"
            let a = a;
            return;
            class B(B) {}
            "#,
        );

        assert_eq!(
            errors,
            [
                "Can't read variable in its own initializer.",
                "Can't return from top-level code.",
                "A class can't inherit from itself.",
            ]
        );
    }

    #[test]
    fn test_resolution_errors_prevent_execution() {
        let reporter = MemoryReporter::new();
        let diagnostics = Diagnostics::new(reporter.clone());
        let mut interpreter = Interpreter::with_parts(
            diagnostics.clone(),
            Natives::empty(),
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        );

        let ok = nyx::run_source(&mut interpreter, "test.nyx", "let ran = true; let a = a;");

        assert!(!ok);
        assert!(diagnostics.had_error());
        assert!(interpreter.globals().borrow().lookup("ran").is_none());
        assert_eq!(
            reporter.messages(),
            ["Can't read variable in its own initializer."]
        );
    }

    #[test]
    fn test_missing_import_is_reported_while_resolving() {
        let errors = resolve("if (false) { import nowhere.at.all; }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_runtime());
        assert!(errors[0]
            .message()
            .starts_with("Could not find module 'nowhere.at.all'"));
    }
}
