use crate::ast::Expr;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;

/// Functions provided by the interpreter itself. They are looked up before
/// user-defined functions, so a user function with the same name is never
/// called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum Builtin {
    #[strum(serialize = "print")]
    Print,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Builtins receive their argument expressions unevaluated, in the
    /// caller's scope.
    pub fn call(
        self,
        interpreter: &Interpreter,
        arguments: &[Expr],
        env: &Environment<'_>,
    ) -> Result<Option<Value>, RuntimeError> {
        match self {
            Self::Print => {
                // Written one at a time, with no separators and no trailing
                // newline. A call that returns nothing writes nothing.
                for arg in arguments {
                    if let Some(value) = interpreter.evaluate_optional(arg, env)? {
                        interpreter.emit(&value.to_string())?;
                    }
                }
                Ok(None)
            }
        }
    }
}
