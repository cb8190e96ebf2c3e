use std::collections::HashMap;

#[derive(Clone, Debug)]
struct Scope<B> {
    bindings: HashMap<String, B>,
}

impl<B> Scope<B> {
    fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }
}

/// Lexical scopes as a stack of frames; the last frame is the current one.
///
/// The checker keeps one of these as its symbol table and the interpreter
/// keeps another as its memory stack. Both push and pop at the same
/// constructs, so a name the checker resolves is resolved the same way at
/// runtime. Reporting unknown names is left to the caller.
#[derive(Clone, Debug)]
pub struct ScopeChain<B> {
    scopes: Vec<Scope<B>>,
}

impl<B> Default for ScopeChain<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ScopeChain<B> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
        tracing::trace!(depth = self.scopes.len(), "push scope");
    }

    /// Discards the current frame. The root frame is never popped; `false`
    /// is returned when that is attempted.
    pub fn pop(&mut self) -> bool {
        if self.scopes.len() == 1 {
            tracing::warn!("attempted to pop the root scope");
            return false;
        }
        self.scopes.pop();
        tracing::trace!(depth = self.scopes.len(), "pop scope");
        true
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the current frame, shadowing outer bindings.
    pub fn declare(&mut self, name: &str, binding: B) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), binding);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&B> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Overwrites the nearest existing binding of `name`. Hands the binding
    /// back when no frame declares the name.
    pub fn assign(&mut self, name: &str, binding: B) -> Result<(), B> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.bindings.get_mut(name))
        {
            Some(slot) => {
                *slot = binding;
                Ok(())
            }
            None => Err(binding),
        }
    }

    /// `assign` if the name is bound anywhere, otherwise `declare` here.
    pub fn assign_or_declare(&mut self, name: &str, binding: B) {
        if let Err(binding) = self.assign(name, binding) {
            self.declare(name, binding);
        }
    }
}
