use crate::runtime::{error::RuntimeError, value::Value};
use crate::scope::ScopeChain;

/// Memory stack of the interpreter.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    scopes: ScopeChain<Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: ScopeChain::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push();
    }

    pub fn pop_scope(&mut self) {
        let popped = self.scopes.pop();
        debug_assert!(popped, "unbalanced scope pop");
    }

    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn declare(&mut self, name: &str, value: Value) {
        self.scopes.declare(name, value);
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.scopes
            .assign(name, value)
            .map_err(|_| RuntimeError::UnknownSymbol {
                name: name.to_string(),
            })
    }

    /// Overwrites an existing binding wherever it lives, or binds `name` in
    /// the innermost scope.
    pub fn store(&mut self, name: &str, value: Value) {
        self.scopes.assign_or_declare(name, value);
    }

    pub fn get(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.scopes
            .lookup(name)
            .ok_or_else(|| RuntimeError::UnknownSymbol {
                name: name.to_string(),
            })
    }
}
