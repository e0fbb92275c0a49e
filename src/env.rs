use std::fmt;

use im::HashMap;
use string_interner::DefaultSymbol;

use crate::heap::LispHeap;
use crate::value::LispValue;

pub type LispSymbol = DefaultSymbol;

/// Handle to an environment frame in the heap's frame registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LispEnv(pub(crate) u32);

impl fmt::Debug for LispEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LispEnv({})", self.0)
    }
}

/// One scope: a binding table and a link to the enclosing scope. The root
/// frame has no parent and is the target of `define`. Frames are swept by
/// the collector like any other heap object.
pub(crate) struct LispFrame {
    pub vars: HashMap<LispSymbol, LispValue>,
    pub parent: Option<LispEnv>,
    pub mark: bool,
}

impl LispFrame {
    pub(crate) fn new(parent: Option<LispEnv>) -> Self {
        LispFrame {
            vars: HashMap::new(),
            parent,
            mark: false,
        }
    }
}

impl LispHeap {
    /// Walk the chain from `env` towards the root, returning the first
    /// binding found.
    pub fn lookup(&self, env: LispEnv, name: LispSymbol) -> Option<LispValue> {
        let mut cur = Some(env);
        while let Some(e) = cur {
            let frame = self.frame(e);
            if let Some(&val) = frame.vars.get(&name) {
                return Some(val);
            }
            cur = frame.parent;
        }
        None
    }

    /// Insert or overwrite a binding in `env` itself.
    pub fn bind(&mut self, env: LispEnv, name: LispSymbol, val: LispValue) {
        self.frame_mut(env).vars.insert(name, val);
    }

    /// Bind in the parent-less frame at the top of the chain.
    pub fn bind_root(&mut self, env: LispEnv, name: LispSymbol, val: LispValue) {
        let mut cur = env;
        while let Some(parent) = self.frame(cur).parent {
            cur = parent;
        }
        self.bind(cur, name, val);
    }

    /// Update an existing binding wherever it lives on the chain; bind in
    /// `env` itself when the name is unbound everywhere.
    pub fn assign(&mut self, env: LispEnv, name: LispSymbol, val: LispValue) {
        let mut cur = Some(env);
        while let Some(e) = cur {
            let frame = self.frame(e);
            if frame.vars.contains_key(&name) {
                self.bind(e, name, val);
                return;
            }
            cur = frame.parent;
        }
        self.bind(env, name, val);
    }
}
