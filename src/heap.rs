use string_interner::StringInterner;

use crate::env::{LispEnv, LispFrame, LispSymbol};
use crate::util::{LispError, Result};
use crate::value::{LispBuiltin, LispBuiltinFn, LispCallable, LispFunc, LispObject, LispValue, ObjId};

/// Collection never fires before this many allocations have happened,
/// regardless of how small the live set is.
const GC_MIN_ALLOCS: usize = 128;

pub(crate) struct LispSlot {
    pub obj: LispObject,
    pub mark: bool,
}

enum MarkItem {
    Obj(ObjId),
    Frame(LispEnv),
}

/// The interpreter context: the object registry, the frame registry, the
/// symbol interner and the collector state. Every evaluator entry point
/// takes `&mut LispHeap`; there is no global state.
///
/// Handles (`LispValue`, `LispEnv`) are plain indices. They stay valid while
/// the object is reachable from the root frame or from a frame on the
/// active evaluation stack; holding one across a `collect` call without a
/// root is a use-after-free in the language sense (the slot may be reused).
pub struct LispHeap {
    objects: Vec<Option<LispSlot>>,
    free_objects: Vec<u32>,
    frames: Vec<Option<LispFrame>>,
    free_frames: Vec<u32>,
    interner: StringInterner,
    root: LispEnv,
    /// Frames of evaluations currently in flight; GC roots besides `root`.
    active: Vec<LispEnv>,
    allocs_since_gc: usize,
    live_at_last_gc: usize,
}

impl LispHeap {
    /// An empty heap with a root frame and no bindings.
    pub fn new() -> Self {
        let mut heap = LispHeap {
            objects: Vec::with_capacity(1024),
            free_objects: Vec::new(),
            frames: Vec::new(),
            free_frames: Vec::new(),
            interner: StringInterner::default(),
            root: LispEnv(0),
            active: Vec::new(),
            allocs_since_gc: 0,
            live_at_last_gc: 0,
        };
        heap.root = heap.new_frame(None);
        heap
    }

    /// A heap with the full built-in surface bound in the root frame.
    pub fn new_stdlib() -> Self {
        let mut heap = Self::new();
        crate::builtins::add_builtins(&mut heap);
        heap
    }

    pub fn root_env(&self) -> LispEnv {
        self.root
    }

    // === allocation ===

    fn alloc(&mut self, obj: LispObject) -> LispValue {
        self.allocs_since_gc += 1;
        let slot = LispSlot { obj, mark: false };
        let id = if let Some(id) = self.free_objects.pop() {
            self.objects[id as usize] = Some(slot);
            id
        } else {
            self.objects.push(Some(slot));
            (self.objects.len() - 1) as u32
        };
        LispValue::Object(ObjId(id))
    }

    pub fn new_number(&mut self, n: i64) -> LispValue {
        self.alloc(LispObject::Number(n))
    }

    pub fn new_symbol(&mut self, name: &str) -> LispValue {
        let sym = self.interner.get_or_intern(name);
        self.alloc(LispObject::Symbol(sym))
    }

    pub fn new_keyword(&mut self, name: &str) -> LispValue {
        let sym = self.interner.get_or_intern(name);
        self.alloc(LispObject::Keyword(sym))
    }

    pub fn new_string(&mut self, s: impl Into<String>) -> LispValue {
        self.alloc(LispObject::String(s.into()))
    }

    pub fn new_bool(&mut self, b: bool) -> LispValue {
        self.alloc(LispObject::Bool(b))
    }

    pub fn new_error(&mut self, message: impl Into<String>) -> LispValue {
        self.alloc(LispObject::Error(message.into()))
    }

    pub fn new_cons(&mut self, car: LispValue, cdr: LispValue) -> LispValue {
        self.alloc(LispObject::Cons(car, cdr))
    }

    pub fn new_user_function(&mut self, func: LispFunc) -> LispValue {
        self.alloc(LispObject::Callable(LispCallable::UserFn(func)))
    }

    pub fn new_user_macro(&mut self, func: LispFunc) -> LispValue {
        self.alloc(LispObject::Callable(LispCallable::UserMacro(func)))
    }

    pub fn new_builtin_function(&mut self, name: &'static str, f: LispBuiltinFn) -> LispValue {
        self.alloc(LispObject::Callable(LispCallable::BuiltinFn(LispBuiltin { name, f })))
    }

    pub fn new_builtin_macro(&mut self, name: &'static str, f: LispBuiltinFn) -> LispValue {
        self.alloc(LispObject::Callable(LispCallable::BuiltinMacro(LispBuiltin { name, f })))
    }

    /// Build a proper list, right to left.
    pub fn new_list(&mut self, items: &[LispValue]) -> LispValue {
        let mut out = LispValue::Nil;
        for &item in items.iter().rev() {
            out = self.new_cons(item, out);
        }
        out
    }

    // === frames ===

    pub fn new_frame(&mut self, parent: Option<LispEnv>) -> LispEnv {
        self.allocs_since_gc += 1;
        let frame = LispFrame::new(parent);
        if let Some(id) = self.free_frames.pop() {
            self.frames[id as usize] = Some(frame);
            LispEnv(id)
        } else {
            self.frames.push(Some(frame));
            LispEnv((self.frames.len() - 1) as u32)
        }
    }

    pub(crate) fn frame(&self, env: LispEnv) -> &LispFrame {
        self.frames[env.0 as usize]
            .as_ref()
            .expect("frame handle outlived its frame")
    }

    pub(crate) fn frame_mut(&mut self, env: LispEnv) -> &mut LispFrame {
        self.frames[env.0 as usize]
            .as_mut()
            .expect("frame handle outlived its frame")
    }

    // === accessors ===

    pub(crate) fn obj(&self, id: ObjId) -> &LispObject {
        &self.objects[id.0 as usize]
            .as_ref()
            .expect("object handle outlived its object")
            .obj
    }

    pub fn get(&self, val: LispValue) -> Option<&LispObject> {
        match val {
            LispValue::Nil => None,
            LispValue::Object(id) => Some(self.obj(id)),
        }
    }

    pub fn intern(&mut self, name: &str) -> LispSymbol {
        self.interner.get_or_intern(name)
    }

    pub(crate) fn intern_static(&mut self, name: &'static str) -> LispSymbol {
        self.interner.get_or_intern_static(name)
    }

    pub fn resolve(&self, sym: LispSymbol) -> &str {
        self.interner.resolve(sym).expect("symbol missing from interner")
    }

    pub fn type_of(&self, val: LispValue) -> &'static str {
        match self.get(val) {
            None => "nil",
            Some(obj) => obj.type_of(),
        }
    }

    pub fn is_error(&self, val: LispValue) -> bool {
        matches!(self.get(val), Some(LispObject::Error(_)))
    }

    pub fn is_cons(&self, val: LispValue) -> bool {
        matches!(self.get(val), Some(LispObject::Cons(_, _)))
    }

    /// nil, false, errors and numbers ≤ 0 are falsy.
    pub fn truthy(&self, val: LispValue) -> bool {
        match self.get(val) {
            None => false,
            Some(LispObject::Bool(b)) => *b,
            Some(LispObject::Error(_)) => false,
            Some(LispObject::Number(n)) => *n > 0,
            Some(_) => true,
        }
    }

    /// car of a non-cons is nil, matching the original interpreter.
    pub fn car(&self, val: LispValue) -> LispValue {
        match self.get(val) {
            Some(LispObject::Cons(car, _)) => *car,
            _ => LispValue::Nil,
        }
    }

    pub fn cdr(&self, val: LispValue) -> LispValue {
        match self.get(val) {
            Some(LispObject::Cons(_, cdr)) => *cdr,
            _ => LispValue::Nil,
        }
    }

    pub(crate) fn set_car(&mut self, id: ObjId, val: LispValue) {
        if let LispObject::Cons(car, _) = &mut self.objects[id.0 as usize]
            .as_mut()
            .expect("object handle outlived its object")
            .obj
        {
            *car = val;
        }
    }

    pub(crate) fn set_cdr(&mut self, id: ObjId, val: LispValue) {
        if let LispObject::Cons(_, cdr) = &mut self.objects[id.0 as usize]
            .as_mut()
            .expect("object handle outlived its object")
            .obj
        {
            *cdr = val;
        }
    }

    /// The cars of a cons spine, in order. An improper tail is ignored.
    pub fn list_to_vec(&self, val: LispValue) -> Vec<LispValue> {
        let mut out = Vec::new();
        let mut cur = val;
        while let Some(LispObject::Cons(car, cdr)) = self.get(cur) {
            out.push(*car);
            cur = *cdr;
        }
        out
    }

    /// Fresh cons cells for the whole graph; atoms are shared.
    pub fn deep_copy(&mut self, val: LispValue) -> LispValue {
        match self.get(val) {
            Some(LispObject::Cons(car, cdr)) => {
                let (car, cdr) = (*car, *cdr);
                let car = self.deep_copy(car);
                let cdr = self.deep_copy(cdr);
                self.new_cons(car, cdr)
            }
            _ => val,
        }
    }

    // === typed argument access ===
    //
    // An error value handed to a typed position forwards unchanged instead
    // of turning into a second-hand type error.

    pub fn expect_number(&self, val: LispValue) -> Result<i64> {
        match self.get(val) {
            Some(LispObject::Number(n)) => Ok(*n),
            Some(LispObject::Error(msg)) => Err(LispError::Raised(msg.clone())),
            other => Err(LispError::InvalidDataType(
                "number",
                other.map(LispObject::type_of).unwrap_or("nil"),
            )),
        }
    }

    pub fn expect_symbol(&self, val: LispValue) -> Result<LispSymbol> {
        match self.get(val) {
            Some(LispObject::Symbol(s)) => Ok(*s),
            Some(LispObject::Error(msg)) => Err(LispError::Raised(msg.clone())),
            other => Err(LispError::InvalidDataType(
                "symbol",
                other.map(LispObject::type_of).unwrap_or("nil"),
            )),
        }
    }

    pub fn expect_string(&self, val: LispValue) -> Result<String> {
        match self.get(val) {
            Some(LispObject::String(s)) => Ok(s.clone()),
            Some(LispObject::Error(msg)) => Err(LispError::Raised(msg.clone())),
            other => Err(LispError::InvalidDataType(
                "string",
                other.map(LispObject::type_of).unwrap_or("nil"),
            )),
        }
    }

    pub fn expect_cons(&self, val: LispValue) -> Result<ObjId> {
        match val {
            LispValue::Object(id) if matches!(self.obj(id), LispObject::Cons(_, _)) => Ok(id),
            _ => match self.get(val) {
                Some(LispObject::Error(msg)) => Err(LispError::Raised(msg.clone())),
                other => Err(LispError::InvalidDataType(
                    "cons",
                    other.map(LispObject::type_of).unwrap_or("nil"),
                )),
            },
        }
    }

    /// Structural equality. Callables compare by identity only.
    pub fn equal(&self, a: LispValue, b: LispValue) -> bool {
        match (a, b) {
            (LispValue::Nil, LispValue::Nil) => true,
            (LispValue::Object(x), LispValue::Object(y)) => {
                if x == y {
                    return true;
                }
                match (self.obj(x), self.obj(y)) {
                    (LispObject::Number(m), LispObject::Number(n)) => m == n,
                    (LispObject::Symbol(s), LispObject::Symbol(t)) => s == t,
                    (LispObject::Keyword(s), LispObject::Keyword(t)) => s == t,
                    (LispObject::String(s), LispObject::String(t)) => s == t,
                    (LispObject::Bool(p), LispObject::Bool(q)) => p == q,
                    (LispObject::Error(s), LispObject::Error(t)) => s == t,
                    (LispObject::Cons(a1, d1), LispObject::Cons(a2, d2)) => {
                        let (a1, d1, a2, d2) = (*a1, *d1, *a2, *d2);
                        self.equal(a1, a2) && self.equal(d1, d2)
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    // === collector ===

    pub(crate) fn push_active(&mut self, env: LispEnv) {
        self.active.push(env);
    }

    pub(crate) fn pop_active(&mut self) {
        self.active.pop();
    }

    pub fn live_objects(&self) -> usize {
        self.objects.len() - self.free_objects.len()
    }

    pub fn live_frames(&self) -> usize {
        self.frames.len() - self.free_frames.len()
    }

    pub fn allocations_since_gc(&self) -> usize {
        self.allocs_since_gc
    }

    /// Collect if enough allocation has happened since the last cycle.
    /// Collection only runs between top-level forms; while any evaluation
    /// is in flight this is a no-op.
    pub fn maybe_collect(&mut self) {
        if !self.active.is_empty() {
            return;
        }
        let threshold = GC_MIN_ALLOCS.max(self.live_at_last_gc + self.live_at_last_gc / 4);
        if self.allocs_since_gc >= threshold {
            self.collect();
        }
    }

    /// Mark from the root frame and the active evaluation stack, then sweep
    /// both registries. Survivors are unmarked so the next cycle starts
    /// from a clean slate.
    pub fn collect(&mut self) {
        let mut work: Vec<MarkItem> = Vec::with_capacity(64);
        work.push(MarkItem::Frame(self.root));
        work.extend(self.active.iter().map(|&env| MarkItem::Frame(env)));

        while let Some(item) = work.pop() {
            match item {
                MarkItem::Frame(env) => {
                    let frame = self.frames[env.0 as usize]
                        .as_mut()
                        .expect("marking a freed frame");
                    if frame.mark {
                        continue;
                    }
                    frame.mark = true;
                    if let Some(parent) = frame.parent {
                        work.push(MarkItem::Frame(parent));
                    }
                    for (_, &val) in frame.vars.iter() {
                        if let LispValue::Object(id) = val {
                            work.push(MarkItem::Obj(id));
                        }
                    }
                }
                MarkItem::Obj(id) => {
                    let slot = self.objects[id.0 as usize]
                        .as_mut()
                        .expect("marking a freed object");
                    if slot.mark {
                        continue;
                    }
                    slot.mark = true;
                    match &slot.obj {
                        LispObject::Cons(car, cdr) => {
                            if let LispValue::Object(id) = car {
                                work.push(MarkItem::Obj(*id));
                            }
                            if let LispValue::Object(id) = cdr {
                                work.push(MarkItem::Obj(*id));
                            }
                        }
                        LispObject::Callable(LispCallable::UserFn(f))
                        | LispObject::Callable(LispCallable::UserMacro(f)) => {
                            if let LispValue::Object(id) = f.body {
                                work.push(MarkItem::Obj(id));
                            }
                            work.push(MarkItem::Frame(f.closure));
                        }
                        _ => {}
                    }
                }
            }
        }

        for (i, slot) in self.objects.iter_mut().enumerate() {
            match slot {
                Some(s) if s.mark => s.mark = false,
                Some(_) => {
                    *slot = None;
                    self.free_objects.push(i as u32);
                }
                None => {}
            }
        }
        for (i, frame) in self.frames.iter_mut().enumerate() {
            match frame {
                Some(f) if f.mark => f.mark = false,
                Some(_) => {
                    *frame = None;
                    self.free_frames.push(i as u32);
                }
                None => {}
            }
        }

        self.allocs_since_gc = 0;
        self.live_at_last_gc = self.live_objects() + self.live_frames();
    }
}

impl Default for LispHeap {
    fn default() -> Self {
        Self::new()
    }
}
