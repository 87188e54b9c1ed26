//! Resolver tests: binding addresses and every static error code (S001–S005).

#[cfg(test)]
mod tests {
    use crate::analysis::{self, Binding, Bindings};
    use crate::error::{Error, ErrorCode, Location};
    use crate::syntax::ast::{Expr, ExprId, Stmt};
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn parse(src: &str) -> Vec<Stmt> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn resolve_ok(src: &str) -> (Vec<Stmt>, Bindings) {
        let stmts = parse(src);
        let bindings = analysis::resolve(&stmts)
            .unwrap_or_else(|errs| panic!("expected resolve to succeed, got {errs:#?}"));
        (stmts, bindings)
    }

    fn resolve_err(src: &str) -> Vec<Error> {
        match analysis::resolve(&parse(src)) {
            Ok(_) => panic!("expected resolve to fail"),
            Err(e) => e,
        }
    }

    fn has_code(errors: &[Error], code: ErrorCode) -> bool {
        errors.iter().any(|e| e.code == code)
    }

    /// Ids of every `Variable` node named `name`, in source order.
    fn reads_of(stmts: &[Stmt], name: &str) -> Vec<ExprId> {
        fn walk_stmt(stmt: &Stmt, name: &str, out: &mut Vec<ExprId>) {
            match stmt {
                Stmt::Expr(e) | Stmt::Print(e, _) => walk_expr(e, name, out),
                Stmt::Var(v) => if let Some(init) = &v.initializer { walk_expr(init, name, out) },
                Stmt::Block(stmts, _) => stmts.iter().for_each(|s| walk_stmt(s, name, out)),
                Stmt::If(i) => {
                    walk_expr(&i.condition, name, out);
                    walk_stmt(&i.then_branch, name, out);
                    if let Some(e) = &i.else_branch { walk_stmt(e, name, out); }
                }
                Stmt::While(w) => {
                    walk_expr(&w.condition, name, out);
                    walk_stmt(&w.body, name, out);
                }
                Stmt::Return(Some(e), _) => walk_expr(e, name, out),
                Stmt::Return(None, _) | Stmt::Break(_) => {}
                Stmt::Function(f) => f.body.iter().for_each(|s| walk_stmt(s, name, out)),
            }
        }
        fn walk_expr(expr: &Expr, name: &str, out: &mut Vec<ExprId>) {
            match expr {
                Expr::Literal(..) => {}
                Expr::Grouping(inner, _) => walk_expr(inner, name, out),
                Expr::Unary { operand, .. } => walk_expr(operand, name, out),
                Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                    walk_expr(left, name, out);
                    walk_expr(right, name, out);
                }
                Expr::Variable { id, name: n, .. } => if n == name { out.push(*id) },
                Expr::Assign { value, .. } => walk_expr(value, name, out),
                Expr::Call { callee, args, .. } => {
                    walk_expr(callee, name, out);
                    args.iter().for_each(|a| walk_expr(a, name, out));
                }
                Expr::Function(f) => f.body.iter().for_each(|s| walk_stmt(s, name, out)),
            }
        }
        let mut out = Vec::new();
        stmts.iter().for_each(|s| walk_stmt(s, name, &mut out));
        out
    }

    // ─── Addresses ───────────────────────────────────────────────────────────

    #[test]
    fn globals_stay_unresolved() {
        let (stmts, bindings) = resolve_ok("var a = 1; print a;");
        assert!(bindings.is_empty());
        assert_eq!(reads_of(&stmts, "a").len(), 1);
    }

    #[test]
    fn local_in_same_block() {
        let (stmts, bindings) = resolve_ok("{ var a = 1; var b = 2; print a + b; }");
        let b = reads_of(&stmts, "b")[0];
        assert_eq!(bindings.get(b), Some(Binding { distance: 0, slot: 1 }));
    }

    #[test]
    fn local_in_enclosing_block() {
        let (stmts, bindings) = resolve_ok("{ var a = 1; { { print a; } } }");
        let a = reads_of(&stmts, "a")[0];
        assert_eq!(bindings.get(a), Some(Binding { distance: 2, slot: 0 }));
    }

    #[test]
    fn parameters_occupy_first_slots() {
        let (stmts, bindings) = resolve_ok("fun f(x, y) { var z = x; print y + z; }");
        let y = reads_of(&stmts, "y")[0];
        let z = reads_of(&stmts, "z")[0];
        assert_eq!(bindings.get(y), Some(Binding { distance: 0, slot: 1 }));
        assert_eq!(bindings.get(z), Some(Binding { distance: 0, slot: 2 }));
    }

    #[test]
    fn closure_reaches_through_function_scope() {
        let (stmts, bindings) = resolve_ok(r#"
            fun outer() {
                var n = 0;
                fun inner() { print n; }
                return inner;
            }
            print outer;
        "#);
        let n = reads_of(&stmts, "n")[0];
        assert_eq!(bindings.get(n), Some(Binding { distance: 1, slot: 0 }));
    }

    #[test]
    fn shadowing_uses_nearest_declaration() {
        let (stmts, bindings) = resolve_ok("{ var a = 1; print a; { var a = 2; print a; } }");
        let reads = reads_of(&stmts, "a");
        assert_eq!(bindings.get(reads[0]), Some(Binding { distance: 0, slot: 0 }));
        assert_eq!(bindings.get(reads[1]), Some(Binding { distance: 0, slot: 0 }));
    }

    #[test]
    fn resolution_is_idempotent() {
        let stmts = parse(r#"
            fun counter() {
                var i = 0;
                fun next() { i = i + 1; return i; }
                return next;
            }
            { var c = counter(); print c(); }
        "#);
        let first = analysis::resolve(&stmts).unwrap();
        let second = analysis::resolve(&stmts).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    // ─── S001: redeclaration ─────────────────────────────────────────────────

    #[test]
    fn s001_redeclare_in_block() {
        let errs = resolve_err("{ var a = 1; var a = 2; print a; }");
        assert!(has_code(&errs, ErrorCode::S001));
        assert_eq!(errs[0].location, Location::At("a".into()));
    }

    #[test]
    fn s001_duplicate_parameter() {
        let errs = resolve_err("fun f(a, a) { print a; }");
        assert!(has_code(&errs, ErrorCode::S001));
    }

    #[test]
    fn global_redeclaration_allowed() {
        resolve_ok("var a = 1; var a = 2; print a;");
    }

    #[test]
    fn shadowing_in_inner_block_allowed() {
        resolve_ok("{ var a = 1; print a; { var a = 2; print a; } }");
    }

    // ─── S002: own initializer ───────────────────────────────────────────────

    #[test]
    fn s002_local_self_reference() {
        let errs = resolve_err("{ var a = a; }");
        assert!(has_code(&errs, ErrorCode::S002));
    }

    #[test]
    fn s002_global_self_reference() {
        let errs = resolve_err("var a = a;");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::S002);
    }

    #[test]
    fn s002_shadowing_outer_in_initializer() {
        let errs = resolve_err("{ var a = 1; print a; { var a = a + 1; print a; } }");
        assert!(has_code(&errs, ErrorCode::S002));
    }

    #[test]
    fn s002_assignment_in_own_initializer() {
        let errs = resolve_err("{ var a = (a = 1); print a; }");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::S002);
    }

    #[test]
    fn global_function_body_may_name_its_variable() {
        resolve_ok("var f = fun () { return f; }; print f;");
    }

    // ─── S003: unused binding ────────────────────────────────────────────────

    #[test]
    fn s003_unused_local() {
        let errs = resolve_err("{ var unused = 1; }");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::S003);
        assert!(errs[0].message.contains("unused"));
    }

    #[test]
    fn s003_unused_parameter() {
        let errs = resolve_err("fun f(a) { return 1; }");
        assert!(has_code(&errs, ErrorCode::S003));
    }

    #[test]
    fn s003_assignment_is_not_a_read() {
        let errs = resolve_err("{ var a; a = 1; }");
        assert!(has_code(&errs, ErrorCode::S003));
    }

    #[test]
    fn unused_global_allowed() {
        resolve_ok("var never_read = 1;");
    }

    // ─── S004 / S005: control flow placement ─────────────────────────────────

    #[test]
    fn s004_top_level_return() {
        let errs = resolve_err("return 1;");
        assert_eq!(errs[0].code, ErrorCode::S004);
        assert_eq!(errs[0].location, Location::At("return".into()));
    }

    #[test]
    fn s004_return_in_block_outside_function() {
        let errs = resolve_err("{ return; }");
        assert!(has_code(&errs, ErrorCode::S004));
    }

    #[test]
    fn s005_break_outside_loop() {
        let errs = resolve_err("break;");
        assert_eq!(errs[0].code, ErrorCode::S005);
    }

    #[test]
    fn s005_break_does_not_cross_function_boundary() {
        let errs = resolve_err("while (true) { fun f() { break; } f(); }");
        assert!(has_code(&errs, ErrorCode::S005));
    }

    #[test]
    fn break_inside_nested_block_in_loop() {
        resolve_ok("while (true) { if (true) { break; } }");
    }

    #[test]
    fn return_inside_loop_inside_function() {
        resolve_ok("fun f() { while (true) { return 1; } } print f;");
    }

    // ─── Multiple errors ─────────────────────────────────────────────────────

    #[test]
    fn walks_whole_tree_after_error() {
        let errs = resolve_err("return; break; { var x = x; print x; }");
        assert!(has_code(&errs, ErrorCode::S004));
        assert!(has_code(&errs, ErrorCode::S005));
        assert!(has_code(&errs, ErrorCode::S002));
    }
}
