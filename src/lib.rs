#![forbid(unsafe_code)]

extern crate anyhow;
extern crate im;
extern crate itertools;
extern crate nom;
extern crate phf;
extern crate string_interner;
extern crate thiserror;

pub mod util;
pub use crate::util::{LispError, Result};
pub mod value;
pub use crate::value::{LispBuiltinFn, LispCallable, LispFunc, LispObject, LispValue, ObjId};
pub mod heap;
pub use crate::heap::LispHeap;
pub mod env;
pub use crate::env::{LispEnv, LispSymbol};
pub mod printer;
pub use crate::printer::print_value;
pub mod parser;
pub use crate::parser::LispParser;
pub mod eval;
pub use crate::eval::{apply, eval, eval_source, expand_macro_once, expand_macros};
mod builtins;
mod specials;
