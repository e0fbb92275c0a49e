#![allow(unused)]

pub use minilisp::{
    apply, eval, eval_source, expand_macro_once, expand_macros, print_value, LispEnv, LispError,
    LispHeap, LispObject, LispParser, LispValue, Result,
};

/// A heap with the full built-in surface, as the binary starts with.
pub fn testing_heap() -> LispHeap {
    LispHeap::new_stdlib()
}

/// Evaluate a batch in the root scope. Returns the last value, or the
/// first error value produced; panics only on reader failures.
pub fn run(heap: &mut LispHeap, src: &str) -> LispValue {
    let root = heap.root_env();
    eval_source(heap, root, src).expect("reader error")
}

/// Evaluate a batch and render the result the way the REPL would.
pub fn show(heap: &mut LispHeap, src: &str) -> String {
    let val = run(heap, src);
    print_value(heap, val)
}
