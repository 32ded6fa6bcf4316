use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::FuncDecl;
use crate::error::RuntimeError;
use crate::interpreter::value::Value;

/// One scope in the environment chain.
///
/// Variables and functions live in separate namespaces. A scope borrows its
/// parent, so the chain lives on the host stack and a scope is dropped when
/// its block or call returns.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    vars: RefCell<HashMap<String, Option<Value>>>,
    funcs: RefCell<HashMap<String, Rc<FuncDecl>>>,
    enclosing: Option<&'a Environment<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: &'a Environment<'a>) -> Self {
        Self {
            vars: RefCell::default(),
            funcs: RefCell::default(),
            enclosing: Some(enclosing),
        }
    }

    /// Define a variable in this scope. `None` declares it without a value.
    pub fn define_var(&self, name: &str, value: Option<Value>) -> Result<(), RuntimeError> {
        let mut vars = self.vars.borrow_mut();
        if vars.contains_key(name) {
            return Err(RuntimeError::new(format!(
                "variable '{name}' is already defined in this scope"
            )));
        }
        vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn define_func(&self, name: &str, decl: Rc<FuncDecl>) -> Result<(), RuntimeError> {
        let mut funcs = self.funcs.borrow_mut();
        if funcs.contains_key(name) {
            return Err(RuntimeError::new(format!(
                "function '{name}' is already defined in this scope"
            )));
        }
        funcs.insert(name.to_string(), decl);
        Ok(())
    }

    pub fn get_var(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(slot) = self.vars.borrow().get(name) {
            return slot.clone().ok_or_else(|| {
                RuntimeError::new(format!("variable '{name}' is used before being assigned"))
            });
        }
        match self.enclosing {
            Some(enclosing) => enclosing.get_var(name),
            None => Err(RuntimeError::new(format!("undefined variable '{name}'"))),
        }
    }

    pub fn get_func(&self, name: &str) -> Result<Rc<FuncDecl>, RuntimeError> {
        if let Some(decl) = self.funcs.borrow().get(name) {
            return Ok(Rc::clone(decl));
        }
        match self.enclosing {
            Some(enclosing) => enclosing.get_func(name),
            None => Err(RuntimeError::new(format!("undefined function '{name}'"))),
        }
    }

    /// Overwrite the variable in the nearest scope that defines it.
    pub fn assign_var(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.vars.borrow_mut().get_mut(name) {
            *slot = Some(value);
            return Ok(());
        }
        match self.enclosing {
            Some(enclosing) => enclosing.assign_var(name, value),
            None => Err(RuntimeError::new(format!("undefined variable '{name}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockStmt, Type};

    fn func(name: &str) -> Rc<FuncDecl> {
        Rc::new(FuncDecl {
            name: name.to_string(),
            params: Vec::new(),
            return_type: Type::Value {
                name: "void".to_string(),
            },
            body: BlockStmt {
                statements: Vec::new(),
                line: 1,
            },
            line: 1,
        })
    }

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define_var("x", Some(Value::Int(42))).unwrap();
        assert_eq!(env.get_var("x").unwrap(), Value::Int(42));
    }

    #[test]
    fn get_undefined_is_error() {
        let env = Environment::new();
        let err = env.get_var("x").unwrap_err();
        assert_eq!(err.message, "undefined variable 'x'");
    }

    #[test]
    fn unassigned_variable_is_error_until_assigned() {
        let env = Environment::new();
        env.define_var("x", None).unwrap();
        assert!(env.get_var("x").unwrap_err().message.contains("before being assigned"));
        env.assign_var("x", Value::Bool(true)).unwrap();
        assert_eq!(env.get_var("x").unwrap(), Value::Bool(true));
    }

    #[test]
    fn duplicate_in_same_scope_is_error() {
        let env = Environment::new();
        env.define_var("x", Some(Value::Int(1))).unwrap();
        assert!(env.define_var("x", Some(Value::Int(2))).is_err());
        env.define_func("f", func("f")).unwrap();
        assert!(env.define_func("f", func("f")).is_err());
    }

    #[test]
    fn shadowing_in_child_scope() {
        let outer = Environment::new();
        outer.define_var("x", Some(Value::Int(1))).unwrap();
        let inner = Environment::with_enclosing(&outer);
        inner.define_var("x", Some(Value::Int(2))).unwrap();
        assert_eq!(inner.get_var("x").unwrap(), Value::Int(2));
        assert_eq!(outer.get_var("x").unwrap(), Value::Int(1));
    }

    #[test]
    fn namespaces_are_separate() {
        let env = Environment::new();
        env.define_var("f", Some(Value::Int(1))).unwrap();
        env.define_func("f", func("f")).unwrap();
        assert_eq!(env.get_var("f").unwrap(), Value::Int(1));
        assert_eq!(env.get_func("f").unwrap().name, "f");
        assert!(env.get_func("g").is_err());
    }

    #[test]
    fn assign_updates_nearest_defining_scope() {
        let outer = Environment::new();
        outer.define_var("x", Some(Value::Int(1))).unwrap();
        {
            let inner = Environment::with_enclosing(&outer);
            inner.assign_var("x", Value::Int(5)).unwrap();
            assert!(inner.assign_var("y", Value::Int(0)).is_err());
        }
        assert_eq!(outer.get_var("x").unwrap(), Value::Int(5));
    }

    #[test]
    fn functions_resolve_through_chain() {
        let outer = Environment::new();
        outer.define_func("helper", func("helper")).unwrap();
        let inner = Environment::with_enclosing(&outer);
        let deeper = Environment::with_enclosing(&inner);
        assert_eq!(deeper.get_func("helper").unwrap().name, "helper");
    }
}
