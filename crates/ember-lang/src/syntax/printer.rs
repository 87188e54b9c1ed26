//! Parenthesized prefix rendering of the AST, for `--ast` dumps and tests.

use crate::syntax::ast::*;

pub fn print_program(stmts: &[Stmt]) -> String {
    stmts.iter().map(print_stmt).collect::<Vec<_>>().join("\n")
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr(e)     => print_expr(e),
        Stmt::Print(e, _) => parenthesize("print", &[print_expr(e)]),
        Stmt::Var(v) => match &v.initializer {
            Some(init) => format!("(var {} {})", v.name, print_expr(init)),
            None       => format!("(var {})", v.name),
        },
        Stmt::Block(stmts, _) => {
            parenthesize("block", &stmts.iter().map(print_stmt).collect::<Vec<_>>())
        }
        Stmt::If(i) => {
            let mut parts = vec![print_expr(&i.condition), print_stmt(&i.then_branch)];
            if let Some(else_branch) = &i.else_branch {
                parts.push(print_stmt(else_branch));
            }
            parenthesize("if", &parts)
        }
        Stmt::While(w) => parenthesize("while", &[print_expr(&w.condition), print_stmt(&w.body)]),
        Stmt::Break(_) => "(break)".to_string(),
        Stmt::Return(value, _) => match value {
            Some(v) => parenthesize("return", &[print_expr(v)]),
            None    => "(return)".to_string(),
        },
        Stmt::Function(decl) => print_function(decl),
    }
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit, _) => match lit {
            Literal::Nil       => "nil".to_string(),
            Literal::Bool(b)   => b.to_string(),
            Literal::Number(n) => n.to_string(),
            Literal::Str(s)    => format!("{s:?}"),
        },
        Expr::Grouping(inner, _) => parenthesize("group", &[print_expr(inner)]),
        Expr::Unary { op, operand, .. } => parenthesize(op.symbol(), &[print_expr(operand)]),
        Expr::Binary { left, op, right, .. } => {
            parenthesize(op.symbol(), &[print_expr(left), print_expr(right)])
        }
        Expr::Logical { left, op, right, .. } => {
            parenthesize(op.symbol(), &[print_expr(left), print_expr(right)])
        }
        Expr::Variable { name, .. } => name.clone(),
        Expr::Assign { name, value, .. } => format!("(= {name} {})", print_expr(value)),
        Expr::Call { callee, args, .. } => {
            let mut parts = vec![print_expr(callee)];
            parts.extend(args.iter().map(print_expr));
            parenthesize("call", &parts)
        }
        Expr::Function(decl) => print_function(decl),
    }
}

fn print_function(decl: &FunctionDecl) -> String {
    let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
    let mut out = String::from("(fun ");
    if let Some(name) = &decl.name {
        out.push_str(name);
        out.push(' ');
    }
    out.push('(');
    out.push_str(&params.join(" "));
    out.push(')');
    for stmt in &decl.body {
        out.push(' ');
        out.push_str(&print_stmt(stmt));
    }
    out.push(')');
    out
}

fn parenthesize(name: &str, parts: &[String]) -> String {
    let mut out = format!("({name}");
    for part in parts {
        out.push(' ');
        out.push_str(part);
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n), Span::new(1, 1))
    }

    #[test]
    fn hand_built_tree() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(num(123.0)),
                span: Span::new(1, 1),
            }),
            op: BinaryOp::Mul,
            right: Box::new(Expr::Grouping(Box::new(num(45.67)), Span::new(1, 1))),
            span: Span::new(1, 1),
        };
        assert_eq!(print_expr(&expr), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn string_literals_are_quoted() {
        let expr = Expr::Literal(Literal::Str("hi".into()), Span::new(1, 1));
        assert_eq!(print_expr(&expr), "\"hi\"");
    }
}
