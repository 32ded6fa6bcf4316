use crate::ast::*;

pub fn to_sexp(program: &Program) -> String {
    let mut buf = String::new();
    for stmt in &program.declarations {
        sexp_stmt(&mut buf, stmt);
        buf.push('\n');
    }
    buf
}

pub fn to_json(program: &Program) -> String {
    serde_json::to_string_pretty(program).expect("AST should be serializable")
}

fn sexp_function(buf: &mut String, f: &FuncDecl) {
    buf.push_str("(func ");
    buf.push_str(&f.name);
    buf.push_str(" (");
    for (i, param) in f.params.iter().enumerate() {
        if i > 0 {
            buf.push(' ');
        }
        buf.push_str(&format!("({} {})", param.name, param.declared_type));
    }
    buf.push_str(") ");
    buf.push_str(&f.return_type.to_string());
    for stmt in &f.body.statements {
        buf.push(' ');
        sexp_stmt(buf, stmt);
    }
    buf.push(')');
}

fn sexp_stmt(buf: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Expression(e) => sexp_expr(buf, &e.expression),
        Stmt::VarDecl(v) => {
            buf.push_str("(var ");
            buf.push_str(&v.name);
            buf.push(' ');
            buf.push_str(&v.declared_type.to_string());
            if let Some(ref init) = v.initializer {
                buf.push(' ');
                sexp_expr(buf, init);
            }
            buf.push(')');
        }
        Stmt::FuncDecl(f) => sexp_function(buf, f),
        Stmt::Return(r) => {
            buf.push_str("(return");
            if let Some(ref val) = r.value {
                buf.push(' ');
                sexp_expr(buf, val);
            }
            buf.push(')');
        }
        Stmt::Block(b) => {
            buf.push_str("(block");
            for stmt in &b.statements {
                buf.push(' ');
                sexp_stmt(buf, stmt);
            }
            buf.push(')');
        }
        Stmt::If(i) => {
            buf.push_str("(if ");
            sexp_expr(buf, &i.condition);
            buf.push(' ');
            sexp_stmt(buf, &i.then_branch);
            if let Some(ref else_branch) = i.else_branch {
                buf.push(' ');
                sexp_stmt(buf, else_branch);
            }
            buf.push(')');
        }
        Stmt::While(w) => {
            buf.push_str(if w.is_for_loop { "(for-while " } else { "(while " });
            sexp_expr(buf, &w.condition);
            buf.push(' ');
            sexp_stmt(buf, &w.body);
            buf.push(')');
        }
        Stmt::Break { .. } => buf.push_str("(break)"),
        Stmt::Continue { .. } => buf.push_str("(continue)"),
    }
}

fn sexp_expr(buf: &mut String, expr: &Expr) {
    match expr {
        Expr::Binary(b) => {
            buf.push('(');
            buf.push_str(&b.operator.to_string());
            buf.push(' ');
            sexp_expr(buf, &b.left);
            buf.push(' ');
            sexp_expr(buf, &b.right);
            buf.push(')');
        }
        Expr::Unary(u) => {
            buf.push('(');
            buf.push_str(&u.operator.to_string());
            buf.push(' ');
            sexp_expr(buf, &u.operand);
            buf.push(')');
        }
        Expr::Literal(l) => match &l.value {
            LiteralValue::Int(n) => buf.push_str(&n.to_string()),
            LiteralValue::Double(n) => buf.push_str(&format!("{n:?}")),
            LiteralValue::Str(s) => {
                buf.push('"');
                buf.push_str(s);
                buf.push('"');
            }
            LiteralValue::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        },
        Expr::Parenthesized(g) => {
            buf.push_str("(group ");
            sexp_expr(buf, &g.expression);
            buf.push(')');
        }
        Expr::Identifier(v) => buf.push_str(&v.name),
        Expr::Assign(a) => {
            buf.push_str("(= ");
            buf.push_str(&a.name);
            buf.push(' ');
            sexp_expr(buf, &a.value);
            buf.push(')');
        }
        Expr::Call(c) => {
            buf.push_str("(call ");
            sexp_expr(buf, &c.callee);
            for arg in &c.arguments {
                buf.push(' ');
                sexp_expr(buf, arg);
            }
            buf.push(')');
        }
        Expr::MemberAccess(m) => {
            buf.push_str("(. ");
            sexp_expr(buf, &m.object);
            buf.push(' ');
            buf.push_str(&m.name);
            buf.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Expr {
        Expr::Literal(LiteralExpr {
            value: LiteralValue::Int(n),
            line: 1,
        })
    }

    #[test]
    fn sexp_binary_expression() {
        let program = Program {
            declarations: vec![Stmt::Expression(ExprStmt {
                expression: Expr::Binary(BinaryExpr {
                    left: Box::new(int(1)),
                    operator: BinaryOp::Add,
                    right: Box::new(Expr::Binary(BinaryExpr {
                        left: Box::new(int(2)),
                        operator: BinaryOp::Multiply,
                        right: Box::new(int(3)),
                        line: 1,
                    })),
                    line: 1,
                }),
                line: 1,
            })],
        };
        let result = to_sexp(&program);
        assert_eq!(result.trim(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn sexp_function_with_pointer_param() {
        let program = Program {
            declarations: vec![Stmt::FuncDecl(FuncDecl {
                name: "f".to_string(),
                params: vec![Param {
                    name: "p".to_string(),
                    declared_type: Type::Pointer {
                        inner: Box::new(Type::Value {
                            name: "int".to_string(),
                        }),
                    },
                }],
                return_type: Type::Value {
                    name: "void".to_string(),
                },
                body: BlockStmt {
                    statements: vec![Stmt::Return(ReturnStmt {
                        value: None,
                        line: 1,
                    })],
                    line: 1,
                },
                line: 1,
            })],
        };
        assert_eq!(to_sexp(&program).trim(), "(func f ((p int*)) void (return))");
    }

    #[test]
    fn json_output_is_valid() {
        let program = Program {
            declarations: vec![Stmt::VarDecl(VarDecl {
                name: "x".to_string(),
                declared_type: Type::Value {
                    name: "int".to_string(),
                },
                initializer: Some(int(42)),
                line: 1,
            })],
        };
        let json = to_json(&program);
        let parsed: serde_json::Value =
            serde_json::from_str(&json).expect("JSON output should be valid");
        assert_eq!(parsed["declarations"][0]["name"], "x");
        assert_eq!(parsed["declarations"][0]["type"], "VarDecl");
    }
}
