pub mod builtins;
pub mod environment;
pub mod value;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::ast::*;
use crate::error::{CompileError, RuntimeError};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;

/// How a statement finished. Anything other than `Normal` unwinds to the
/// nearest enclosing loop or function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Normal,
    Return(Option<Value>),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: Environment<'static>,
    output: RefCell<String>,
    /// Writer for print output (allows testing without stdout)
    writer: RefCell<Box<dyn Write>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            globals: Environment::new(),
            output: RefCell::new(String::new()),
            writer: RefCell::new(writer),
        }
    }

    /// Everything printed so far.
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    /// Bind every top-level function into the global scope.
    pub fn load(&mut self, program: &Program) -> Result<(), CompileError> {
        for stmt in &program.declarations {
            match stmt {
                Stmt::FuncDecl(f) => {
                    tracing::debug!(function = %f.name, "loading function");
                    self.globals
                        .define_func(&f.name, Rc::new(f.clone()))
                        .map_err(|e| CompileError::load(e.message, f.line))?;
                }
                other => {
                    return Err(CompileError::load(
                        "top-level statements can only be function declarations",
                        other.line(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Call `entry` with no arguments and return whatever it returns.
    pub fn run(&self, entry: &str) -> Result<Option<Value>, RuntimeError> {
        let decl = self.globals.get_func(entry)?;
        let result = self.call_function(&decl, Vec::new(), &self.globals, decl.line);
        self.flush()?;
        result
    }

    pub(crate) fn emit(&self, text: &str) -> Result<(), RuntimeError> {
        self.writer
            .borrow_mut()
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::new(format!("failed to write output: {e}")))?;
        self.output.borrow_mut().push_str(text);
        Ok(())
    }

    fn flush(&self) -> Result<(), RuntimeError> {
        self.writer
            .borrow_mut()
            .flush()
            .map_err(|e| RuntimeError::new(format!("failed to write output: {e}")))
    }

    fn execute(&self, stmt: &Stmt, env: &Environment<'_>) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate_optional(&e.expression, env)?;
                Ok(Signal::Normal)
            }
            Stmt::VarDecl(v) => {
                let value = match &v.initializer {
                    Some(init) => Some(self.evaluate(init, env)?),
                    None => None,
                };
                env.define_var(&v.name, value)
                    .map_err(|e| e.with_line(v.line))?;
                Ok(Signal::Normal)
            }
            Stmt::FuncDecl(f) => Err(RuntimeError::at_line(
                format!(
                    "invalid statement: function '{}' can only be declared at the top level",
                    f.name
                ),
                f.line,
            )),
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(val) => Some(self.evaluate(val, env)?),
                    None => None,
                };
                Ok(Signal::Return(value))
            }
            Stmt::Block(b) => {
                let child = Environment::with_enclosing(env);
                self.execute_block(&b.statements, &child)
            }
            Stmt::If(i) => {
                if self.evaluate(&i.condition, env)?.is_truthy() {
                    self.execute(&i.then_branch, env)
                } else if let Some(ref else_branch) = i.else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While(w) => self.execute_while(w, env),
            Stmt::Break { .. } => Ok(Signal::Break),
            Stmt::Continue { .. } => Ok(Signal::Continue),
        }
    }

    fn execute_block(
        &self,
        statements: &[Stmt],
        env: &Environment<'_>,
    ) -> Result<Signal, RuntimeError> {
        for stmt in statements {
            match self.execute(stmt, env)? {
                Signal::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }

    fn execute_while(&self, w: &WhileStmt, env: &Environment<'_>) -> Result<Signal, RuntimeError> {
        while self.evaluate(&w.condition, env)?.is_truthy() {
            match self.execute(&w.body, env)? {
                Signal::Normal => {}
                Signal::Break => break,
                Signal::Continue => {
                    // `continue` skipped the increment appended by the `for`
                    // desugaring; run it before the condition is re-tested.
                    if let Some(increment) = for_increment(w) {
                        self.execute(increment, env)?;
                    }
                }
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }

    fn evaluate(&self, expr: &Expr, env: &Environment<'_>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(l) => Ok(Value::from(&l.value)),
            Expr::Parenthesized(p) => self.evaluate(&p.expression, env),
            Expr::Identifier(i) => env.get_var(&i.name).map_err(|e| e.with_line(i.line)),
            Expr::Unary(u) => {
                let operand = self.evaluate(&u.operand, env)?;
                value::unary(u.operator, &operand).map_err(|e| e.with_line(u.line))
            }
            Expr::Binary(b) => {
                // Both operands are always evaluated, `and`/`or` included.
                let left = self.evaluate(&b.left, env)?;
                let right = self.evaluate(&b.right, env)?;
                value::binary(b.operator, &left, &right).map_err(|e| e.with_line(b.line))
            }
            Expr::Assign(a) => {
                let value = self.evaluate(&a.value, env)?;
                env.assign_var(&a.name, value.clone())
                    .map_err(|e| e.with_line(a.line))?;
                Ok(value)
            }
            Expr::MemberAccess(m) => Err(RuntimeError::at_line(
                format!("member access ('.{}') is not supported", m.name),
                m.line,
            )),
            Expr::Call(c) => {
                let callee = callee_name(c)?;
                self.evaluate_call(c, env)?.ok_or_else(|| {
                    RuntimeError::at_line(
                        format!("function '{callee}' does not return a value"),
                        c.line,
                    )
                })
            }
        }
    }

    /// Evaluate `expr` where a missing value is acceptable. A call to a
    /// function that returns nothing yields `None`.
    pub(crate) fn evaluate_optional(
        &self,
        expr: &Expr,
        env: &Environment<'_>,
    ) -> Result<Option<Value>, RuntimeError> {
        match expr {
            Expr::Call(c) => self.evaluate_call(c, env),
            expr => self.evaluate(expr, env).map(Some),
        }
    }

    fn evaluate_call(
        &self,
        c: &CallExpr,
        env: &Environment<'_>,
    ) -> Result<Option<Value>, RuntimeError> {
        let name = callee_name(c)?;

        if let Some(builtin) = Builtin::lookup(name) {
            return builtin
                .call(self, &c.arguments, env)
                .map_err(|e| e.with_line(c.line));
        }

        let decl = env.get_func(name).map_err(|e| e.with_line(c.line))?;
        if c.arguments.len() != decl.params.len() {
            return Err(RuntimeError::at_line(
                format!(
                    "function '{name}' expects {} arguments but got {}",
                    decl.params.len(),
                    c.arguments.len()
                ),
                c.line,
            ));
        }
        let args = c
            .arguments
            .iter()
            .map(|arg| self.evaluate(arg, env))
            .collect::<Result<Vec<_>, _>>()?;
        self.call_function(&decl, args, env, c.line)
    }

    /// Run a function body. The parameter scope's parent is the caller's
    /// scope, so names visible at the call site stay visible in the callee.
    fn call_function(
        &self,
        decl: &FuncDecl,
        args: Vec<Value>,
        caller: &Environment<'_>,
        line: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        if args.len() != decl.params.len() {
            return Err(RuntimeError::at_line(
                format!(
                    "function '{}' expects {} arguments but got {}",
                    decl.name,
                    decl.params.len(),
                    args.len()
                ),
                line,
            ));
        }
        tracing::debug!(function = %decl.name, line, "calling function");

        let call_env = Environment::with_enclosing(caller);
        for (param, arg) in decl.params.iter().zip(args) {
            call_env
                .define_var(&param.name, Some(arg))
                .map_err(|e| e.with_line(decl.line))?;
        }

        let body_env = Environment::with_enclosing(&call_env);
        match self.execute_block(&decl.body.statements, &body_env)? {
            Signal::Normal => Ok(None),
            Signal::Return(value) => Ok(value),
            Signal::Break | Signal::Continue => Err(RuntimeError::at_line(
                format!("loop control escaped function '{}'", decl.name),
                decl.line,
            )),
        }
    }
}

fn callee_name(c: &CallExpr) -> Result<&str, RuntimeError> {
    match c.callee.as_ref() {
        Expr::Identifier(i) => Ok(&i.name),
        _ => Err(RuntimeError::at_line(
            "only named functions can be called",
            c.line,
        )),
    }
}

/// The increment statement of a desugared `for` loop, if it has one.
fn for_increment(w: &WhileStmt) -> Option<&Stmt> {
    if !w.is_for_loop {
        return None;
    }
    match w.body.as_ref() {
        Stmt::Block(b) => b.statements.last(),
        _ => None,
    }
}
