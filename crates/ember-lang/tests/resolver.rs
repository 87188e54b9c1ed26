//! Static analysis tests through the public entry points.
//!
//! Covers how lexer, parser and resolver diagnostics surface to a driver:
//! codes, rendered messages, and that every independent error is reported.

use ember_lang::{Error, ErrorCode, Location, ReplInput, parse, parse_repl, resolve, resolve_expr};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn static_errors(src: &str) -> Vec<Error> {
    match parse(src) {
        Err(errs) => errs,
        Ok(stmts) => match resolve(&stmts) {
            Err(errs) => errs,
            Ok(_) => panic!("expected static errors for {src:?}"),
        },
    }
}

fn codes(errs: &[Error]) -> Vec<ErrorCode> {
    errs.iter().map(|e| e.code).collect()
}

fn rendered(errs: &[Error]) -> Vec<String> {
    errs.iter().map(|e| e.to_string()).collect()
}

// ─── Rendering ───────────────────────────────────────────────────────────────

#[test]
fn self_initializer_message() {
    let errs = static_errors("var a = a;");
    assert_eq!(rendered(&errs), vec![
        "[line 1] Error at 'a': can't read global variable `a` in its own initializer".to_string(),
    ]);
}

#[test]
fn local_self_initializer_in_any_scope() {
    for src in ["{ var a = a; }", "fun f() { var a = a; } f();", "{ { var b = 1; print b; { var a = a; } } }"] {
        let errs = static_errors(src);
        assert!(codes(&errs).contains(&ErrorCode::S002), "{src}: {errs:#?}");
    }
}

#[test]
fn unused_local_message() {
    let errs = static_errors("{\n  var spare = 1;\n}");
    assert_eq!(rendered(&errs), vec![
        "[line 2] Error at 'spare': variable `spare` declared but never used".to_string(),
    ]);
}

#[test]
fn missing_semicolon_points_at_end() {
    let errs = static_errors("print 1");
    assert_eq!(errs[0].code, ErrorCode::P002);
    assert_eq!(errs[0].location, Location::End);
}

#[test]
fn lexer_errors_surface_through_parse() {
    let errs = static_errors("print \"open;");
    assert_eq!(codes(&errs), vec![ErrorCode::L002]);
}

#[test]
fn error_codes_render_textually() {
    assert_eq!(ErrorCode::S004.as_str(), "S004");
    assert_eq!(ErrorCode::P005.to_string(), "P005");
}

#[test]
fn unclosed_block_comment_is_reported() {
    let errs = static_errors("/* never closed\nprint 1;");
    assert_eq!(codes(&errs), vec![ErrorCode::L004]);
    assert_eq!(errs[0].to_string(), "[line 1] Error at end: unterminated block comment");
}

#[test]
fn deeply_nested_source_is_a_static_error() {
    let src = format!("print {}1{};", "(".repeat(10_000), ")".repeat(10_000));
    assert_eq!(codes(&static_errors(&src)), vec![ErrorCode::P005]);
}

// ─── Multiple errors ─────────────────────────────────────────────────────────

#[test]
fn parser_reports_every_broken_statement() {
    let errs = static_errors("var = 1;\nprint 2;\nprint (;\nvar ok = 3;\n1 + ;");
    assert_eq!(errs.len(), 3);
    assert_eq!(errs.iter().map(|e| e.line).collect::<Vec<_>>(), vec![1, 3, 5]);
}

#[test]
fn invalid_assignment_target_does_not_stop_parsing() {
    let errs = static_errors("1 + 2 = 3;\nprint ;");
    assert_eq!(codes(&errs), vec![ErrorCode::P003, ErrorCode::P001]);
}

#[test]
fn resolver_reports_every_binding_error() {
    let src = r#"
        return 1;
        {
            var a = 1;
            var a = 2;
            print a;
        }
        break;
        fun f(unused) {}
        f(1);
    "#;
    let errs = static_errors(src);
    let found = codes(&errs);
    for code in [ErrorCode::S001, ErrorCode::S003, ErrorCode::S004, ErrorCode::S005] {
        assert!(found.contains(&code), "missing {code} in {found:?}");
    }
}

#[test]
fn syntax_errors_skip_resolution() {
    // the resolver would also flag the unused local, but parsing fails first
    let errs = static_errors("{ var spare = 1; } print ;");
    assert_eq!(codes(&errs), vec![ErrorCode::P001]);
}

// ─── Control flow placement ──────────────────────────────────────────────────

#[test]
fn break_in_for_loop_is_allowed() {
    let stmts = parse("for (var i = 0; i < 10; i = i + 1) { if (i > 2) break; print i; }").unwrap();
    assert!(resolve(&stmts).is_ok());
}

#[test]
fn return_in_anonymous_function_is_allowed() {
    let stmts = parse("var f = fun () { return 1; }; print f();").unwrap();
    assert!(resolve(&stmts).is_ok());
}

#[test]
fn break_in_function_inside_loop_is_rejected() {
    let errs = static_errors("for (;;) { var g = fun () { break; }; g(); }");
    assert!(codes(&errs).contains(&ErrorCode::S005));
}

// ─── Bindings ────────────────────────────────────────────────────────────────

#[test]
fn resolving_twice_gives_identical_bindings() {
    let stmts = parse(r#"
        fun outer(x) {
            var y = x;
            fun inner() { return x + y; }
            return inner;
        }
        { var z = outer(1); print z(); }
    "#).unwrap();
    assert_eq!(resolve(&stmts).unwrap(), resolve(&stmts).unwrap());
}

#[test]
fn every_local_reference_gets_an_address() {
    let stmts = parse("{ var a = 1; var b = a; b = a + b; print b; }").unwrap();
    // reads: a, a, b, b; writes: b
    assert_eq!(resolve(&stmts).unwrap().len(), 5);
}

#[test]
fn global_program_has_no_addresses() {
    let stmts = parse("var a = 1; a = a + 1; print a;").unwrap();
    assert!(resolve(&stmts).unwrap().is_empty());
}

#[test]
fn separately_parsed_programs_never_share_ids() {
    let first = parse("{ var a = 1; print a; }").unwrap();
    let second = parse("{ var a = 1; print a; }").unwrap();
    let first = resolve(&first).unwrap();
    let second = resolve(&second).unwrap();
    let first_ids: Vec<_> = first.iter().map(|(id, _)| id).collect();
    assert!(second.iter().all(|(id, _)| !first_ids.contains(&id)));
}

// ─── REPL input ──────────────────────────────────────────────────────────────

#[test]
fn repl_line_without_semicolon_is_an_expression() {
    let Ok(ReplInput::Expr(expr)) = parse_repl("1 + 2") else {
        panic!("expected a bare expression");
    };
    assert!(resolve_expr(&expr).unwrap().is_empty());
}

#[test]
fn repl_line_with_statements_is_a_program() {
    match parse_repl("var a = 1; print a;") {
        Ok(ReplInput::Program(stmts)) => assert_eq!(stmts.len(), 2),
        other => panic!("expected a program, got {other:?}"),
    }
}

#[test]
fn repl_expression_may_define_closures() {
    let Ok(ReplInput::Expr(expr)) = parse_repl("fun (n) { return n; }") else {
        panic!("expected a bare expression");
    };
    assert_eq!(resolve_expr(&expr).unwrap().len(), 1);
}
