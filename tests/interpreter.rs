#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use nyx::error::{Diagnostics, MemoryReporter, StderrReporter, PROMPT_FILE};
    use nyx::interpreter::Interpreter;
    use nyx::module::{ModuleRegistry, SearchPaths};
    use nyx::natives::Natives;
    use nyx::value::Value;

    /// Outcome of one program run.
    struct Run {
        ok: bool,
        output: Vec<String>,
        errors: Vec<String>,
    }

    fn run(source: &str) -> Run {
        let reporter = MemoryReporter::new();
        let diagnostics = Diagnostics::new(reporter.clone());

        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);

        let mut natives = Natives::empty();
        natives.define("print", 1, move |_, args| {
            sink.borrow_mut().push(args[0].to_string());
            Ok(Value::Nil)
        });

        let mut interpreter = Interpreter::with_parts(
            diagnostics,
            natives,
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        );

        let ok = nyx::run_source(&mut interpreter, "test.nyx", source);
        let output = output.borrow().clone();

        Run {
            ok,
            output,
            errors: reporter.messages(),
        }
    }

    fn assert_output(source: &str, expected: &[&str]) {
        let result = run(source);

        assert!(result.ok, "program failed: {:?}", result.errors);
        assert_eq!(result.output, expected);
    }

    fn assert_runtime_error(source: &str, message: &str) {
        let result = run(source);

        assert!(!result.ok, "program unexpectedly succeeded");
        assert_eq!(result.errors, [message]);
    }

    #[test]
    fn test_closure_counters_are_independent() {
        assert_output(
            r#"
            fun makeCounter() {
                let i = 0;
                fun count() {
                    i += 1;
                    return i;
                }
                return count;
            }

            let a = makeCounter();
            let b = makeCounter();
            print(a());
            print(a());
            print(b());
            "#,
            &["1", "2", "1"],
        );
    }

    #[test]
    fn test_anonymous_function_closure() {
        assert_output(
            r#"
            fun adder(n) {
                return fun (x) { return x + n; };
            }
            let add2 = adder(2);
            print(add2(40));
            "#,
            &["42"],
        );
    }

    #[test]
    fn test_resolution_ignores_later_shadowing() {
        assert_output(
            r#"
            let a = "global";
            {
                fun show() { print(a); }
                show();
                let a = "local";
                show();
                print(a);
            }
            "#,
            &["global", "global", "local"],
        );
    }

    #[test]
    fn test_super_dispatch_binds_subclass_instance() {
        assert_output(
            r#"
            class A {
                name() { return "A"; }
                greet() { return "hi " + this.name(); }
            }
            class B(A) {
                name() { return "B"; }
                greet() { return super.greet() + "!"; }
            }
            print(B().greet());
            "#,
            &["hi B!"],
        );
    }

    #[test]
    fn test_fields_methods_and_compound_set() {
        assert_output(
            r#"
            class Point {
                init(x) { this.x = x; }
                get() { return this.x; }
            }
            let p = Point(2);
            p.x += 3;
            print(p.get());
            let m = p.get;
            p.x *= 2;
            print(m());
            "#,
            &["5", "10"],
        );
    }

    #[test]
    fn test_init_is_inherited_with_its_arity() {
        assert_output(
            r#"
            class A { init(a) { this.a = a; } }
            class B(A) {}
            print(B(4).a);
            "#,
            &["4"],
        );

        assert_runtime_error(
            "class A { init(a) {} } A();",
            "Expected 1 arguments but got 0.",
        );
    }

    #[test]
    fn test_init_return_value_rules() {
        assert_runtime_error(
            "class C { init() { return 5; } } C();",
            "Did not expect non-nil return inside init.",
        );

        assert_output(
            "class D { init(x) { this.x = x; return; this.x = 0; } } print(D(3).x);",
            &["3"],
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_output(
            r#"
            print("x" + nil);
            print("x" + nil == "xnil");
            print("n=" + 1.5);
            print("" + true);
            "#,
            &["xnil", "true", "n=1.5", "true"],
        );

        assert_runtime_error(
            "print(1 + \"x\");",
            "Operands must be two numbers or a string followed by any value.",
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert_runtime_error(
            "fun f(a, b) {} f(1);",
            "Expected 2 arguments but got 1.",
        );
        assert_runtime_error(
            "fun f(a, b) {} f(1, 2, 3);",
            "Expected 2 arguments but got 3.",
        );
    }

    #[test]
    fn test_explicit_nil_return() {
        assert_output(
            r#"
            class A {
                init() {
                    this.ready = true;
                    return nil;
                }
            }
            let a = A();
            print(a);
            print(a.ready);

            fun f() { return nil; }
            fun g() {}
            print(f());
            print(f() == g());
            "#,
            &["<A instance>", "true", "nil", "true"],
        );
    }

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_output(
            r#"
            print(1 + 2 * 3);
            print(10 / 4);
            print(10 / 2);
            print(-(3 - 5));
            print(1 / 0);
            "#,
            &["7", "2.5", "5", "2", "inf"],
        );

        assert_runtime_error("print(-\"a\");", "Operand must be a number.");
        assert_runtime_error("print(2 * nil);", "Operands must be numbers.");
    }

    #[test]
    fn test_equality() {
        assert_output(
            r#"
            print(nil == nil);
            print(1 == "1");
            print("a" == "a");
            print(nil != false);
            class K {}
            let k = K();
            print(k == k);
            print(k == K());
            "#,
            &["true", "false", "true", "true", "true", "false"],
        );
    }

    #[test]
    fn test_only_true_takes_the_branch() {
        assert_output(
            r#"
            if (1) print("yes"); else print("no");
            if (nil) print("yes"); else print("no");
            if (true) print("yes"); else print("no");
            "#,
            &["no", "no", "yes"],
        );
    }

    #[test]
    fn test_loops() {
        assert_output(
            r#"
            let total = 0;
            for (let i = 1; i <= 4; i += 1) total += i;
            print(total);

            let n = 3;
            while (n > 0) { n -= 1; }
            print(n);
            "#,
            &["10", "0"],
        );
    }

    #[test]
    fn test_return_from_inside_loop() {
        assert_output(
            r#"
            fun find() {
                let i = 0;
                while (true) {
                    i += 1;
                    if (i == 3) return i;
                }
            }
            print(find());
            "#,
            &["3"],
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_output(
            r#"
            print(true and false);
            print(false or true);
            print(false and undefinedName);
            print(true or undefinedName);
            "#,
            &["false", "true", "false", "true"],
        );

        assert_runtime_error("print(1 and true);", "Operand must be a boolean.");
        assert_runtime_error("print(!nil);", "Operand must be a boolean.");
    }

    #[test]
    fn test_callable_display() {
        assert_output(
            r#"
            class P {}
            fun g() {}
            print(P);
            print(P());
            print(print);
            print(g);
            print(fun () {});
            print(g());
            "#,
            &[
                "<class P>",
                "<P instance>",
                "<native fn print>",
                "<fn g>",
                "<fn>",
                "nil",
            ],
        );
    }

    #[test]
    fn test_runtime_errors() {
        assert_runtime_error("print(y);", "Undefined variable 'y'.");
        assert_runtime_error("z = 1;", "Variable 'z' is not declared.");
        assert_runtime_error("let a = 1; let a = 2;", "Variable 'a' is already declared.");
        assert_runtime_error("let x = 1; x();", "Can only call functions and classes.");
        assert_runtime_error(
            "let x = 1; print(x.y);",
            "Only instances and modules have properties, got number.",
        );
        assert_runtime_error(
            "let x = \"s\"; x.y = 1;",
            "Only instances have fields, got string.",
        );
        assert_runtime_error(
            "class E {} print(E().missing);",
            "Undefined property 'missing'.",
        );
        assert_runtime_error("let NotClass = 1; class C(NotClass) {}", "Superclass must be a class.");
    }

    #[test]
    fn test_runtime_error_stops_execution() {
        let result = run("print(\"a\"); print(y); print(\"b\");");

        assert!(!result.ok);
        assert_eq!(result.output, ["a"]);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_runtime_error_location() {
        let reporter = MemoryReporter::new();
        let diagnostics = Diagnostics::new(reporter.clone());
        let mut interpreter = Interpreter::with_parts(
            Rc::clone(&diagnostics),
            Natives::empty(),
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        );

        assert!(!nyx::run_source(&mut interpreter, "loc.nyx", "let a = 1;\n  a();"));

        let entries = reporter.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, "loc.nyx");
        assert_eq!(entries[0].line, 2);
        assert_eq!(entries[0].column, 5);
        assert!(diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn test_state_survives_between_runs() {
        let diagnostics = Diagnostics::new(MemoryReporter::new());
        let mut interpreter = Interpreter::with_parts(
            diagnostics,
            Natives::empty(),
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        );

        assert!(nyx::run_source(&mut interpreter, "a.nyx", "let count = 1;"));
        assert!(nyx::run_source(&mut interpreter, "b.nyx", "count += 1;"));

        let value = interpreter.globals().borrow().lookup("count");
        assert_eq!(value, Some(Value::Number(2.0)));
        assert_eq!(interpreter.globals().borrow().names(), ["count"]);
    }

    #[test]
    fn test_error_excerpt_skips_prompt_input() {
        assert_eq!(StderrReporter::source_line(PROMPT_FILE, 1), None);

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("src.nyx");
        std::fs::write(&path, "let a = 1;\nprint(a);\n").expect("write source");
        let file = path.display().to_string();

        assert_eq!(
            StderrReporter::source_line(&file, 2).as_deref(),
            Some("print(a);")
        );
        assert_eq!(StderrReporter::source_line(&file, 3), None);
    }

    #[test]
    fn test_native_receives_arguments() {
        let diagnostics = Diagnostics::new(MemoryReporter::new());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut natives = Natives::empty();
        natives.define("record", 2, move |_, args| {
            sink.borrow_mut().push(format!("{}:{}", args[0], args[1]));
            Ok(Value::Bool(true))
        });
        natives.define("fail", 0, |_, _| Err("boom".to_owned()));
        assert_eq!(natives.names().collect::<Vec<_>>(), ["record", "fail"]);

        let mut interpreter = Interpreter::with_parts(
            diagnostics,
            natives,
            ModuleRegistry::shared(SearchPaths::new(Vec::<PathBuf>::new())),
        );

        assert!(nyx::run_source(&mut interpreter, "n.nyx", "let r = record(\"k\", 3);"));
        assert_eq!(*seen.borrow(), ["k:3"]);

        assert!(!nyx::run_source(&mut interpreter, "n.nyx", "fail();"));
    }
}
