use crate::env::LispEnv;
use crate::heap::LispHeap;
use crate::parser::LispParser;
use crate::printer::print_value;
use crate::specials::{eval_special, special_form};
use crate::util::{LispError, Result};
use crate::value::{LispCallable, LispFunc, LispObject, LispValue};

/// Evaluate one form. Errors are first-class values in the language, so
/// this never fails at the Rust level; anything that goes wrong comes back
/// as an `Error` object.
pub fn eval(heap: &mut LispHeap, env: LispEnv, ast: LispValue) -> LispValue {
    // the active stack keeps in-flight scopes visible to the collector
    heap.push_active(env);
    let out = eval_inner(heap, env, ast);
    heap.pop_active();
    out
}

fn eval_inner(heap: &mut LispHeap, env: LispEnv, ast: LispValue) -> LispValue {
    let id = match ast {
        LispValue::Nil => return LispValue::Nil,
        LispValue::Object(id) => id,
    };
    match heap.obj(id) {
        LispObject::Symbol(s) => {
            let s = *s;
            // a bare unbound symbol is nil; only the head of an
            // application turns that into a name error
            heap.lookup(env, s).unwrap_or(LispValue::Nil)
        }
        LispObject::Cons(car, cdr) => {
            let (head, tail) = (*car, *cdr);
            eval_list(heap, env, head, tail)
        }
        // numbers, strings, booleans, keywords, errors and callables
        _ => ast,
    }
}

fn eval_list(heap: &mut LispHeap, env: LispEnv, head: LispValue, tail: LispValue) -> LispValue {
    if let Some(LispObject::Symbol(s)) = heap.get(head) {
        if let Some(form) = special_form(heap.resolve(*s)) {
            let args = heap.list_to_vec(tail);
            return eval_special(heap, env, form, &args);
        }
    }

    let f = eval(heap, env, head);
    if f.is_nil() {
        let name = print_value(heap, head);
        let err = LispError::UndefinedFunction(name);
        return heap.new_error(err.to_string());
    }
    let callable = match heap.get(f) {
        Some(LispObject::Callable(c)) => c.clone(),
        Some(obj) => {
            let err = LispError::InvalidDataType("function", obj.type_of());
            return heap.new_error(err.to_string());
        }
        None => unreachable!("nil handled above"),
    };

    let arg_forms = heap.list_to_vec(tail);
    if callable.is_macro() {
        // macro arguments stay unevaluated; the expansion runs again in
        // the caller's scope
        let expansion = apply(heap, env, f, &arg_forms);
        if heap.is_error(expansion) {
            return expansion;
        }
        eval(heap, env, expansion)
    } else {
        let args: Vec<LispValue> = arg_forms
            .iter()
            .map(|&form| eval(heap, env, form))
            .collect();
        apply(heap, env, f, &args)
    }
}

/// Bind an argument vector and run a callable. No macro re-evaluation
/// happens here; `eval` layers that on itself, so `apply` and the
/// `macroexpand` family see the raw expansion.
pub fn apply(heap: &mut LispHeap, env: LispEnv, f: LispValue, args: &[LispValue]) -> LispValue {
    let callable = match heap.get(f) {
        Some(LispObject::Callable(c)) => c.clone(),
        other => {
            let received = other.map(|obj| obj.type_of()).unwrap_or("nil");
            let err = LispError::InvalidDataType("function", received);
            return heap.new_error(err.to_string());
        }
    };
    match callable {
        LispCallable::BuiltinFn(b) | LispCallable::BuiltinMacro(b) => (b.f)(heap, env, args)
            .unwrap_or_else(|err| heap.new_error(err.to_string())),
        LispCallable::UserFn(func) | LispCallable::UserMacro(func) => {
            let call_env = bind_params(heap, &func, args);
            eval(heap, call_env, func.body)
        }
    }
}

fn bind_params(heap: &mut LispHeap, func: &LispFunc, args: &[LispValue]) -> LispEnv {
    let call_env = heap.new_frame(Some(func.closure));
    for (i, &param) in func.params.iter().enumerate() {
        let val = match func.rest_index {
            // arguments from the `&` position onward collect into a list;
            // parameters after it have nothing left to bind
            Some(rest) if i == rest => {
                let rest_args = args.get(rest..).unwrap_or_default();
                heap.new_list(rest_args)
            }
            Some(rest) if i > rest => LispValue::Nil,
            _ => args.get(i).copied().unwrap_or(LispValue::Nil),
        };
        heap.bind(call_env, param, val);
    }
    call_env
}

/// Expand `form` once if it is a macro call; the flag reports whether an
/// expansion happened.
pub fn expand_macro_once(heap: &mut LispHeap, env: LispEnv, form: LispValue) -> (LispValue, bool) {
    let Some(LispObject::Cons(car, cdr)) = heap.get(form) else {
        return (form, false);
    };
    let (head, tail) = (*car, *cdr);
    let Some(LispObject::Symbol(s)) = heap.get(head) else {
        return (form, false);
    };
    let Some(f) = heap.lookup(env, *s) else {
        return (form, false);
    };
    let is_macro = matches!(heap.get(f), Some(LispObject::Callable(c)) if c.is_macro());
    if !is_macro {
        return (form, false);
    }
    let args = heap.list_to_vec(tail);
    (apply(heap, env, f, &args), true)
}

/// Expand macro calls until the head no longer names a macro.
pub fn expand_macros(heap: &mut LispHeap, env: LispEnv, form: LispValue) -> LispValue {
    let mut cur = form;
    loop {
        let (next, expanded) = expand_macro_once(heap, env, cur);
        if !expanded || heap.is_error(next) {
            return next;
        }
        cur = next;
    }
}

/// The read+eval entry point: evaluate every top-level form of `source` in
/// `env`, stopping at the first error value (which is returned for the
/// caller to surface). Reader failures are `Err`; they abort the batch the
/// same way an error value does.
pub fn eval_source(heap: &mut LispHeap, env: LispEnv, source: &str) -> Result<LispValue> {
    let mut parser = LispParser::new(source);
    let mut last = LispValue::Nil;
    while let Some(form) = parser.next_form(heap)? {
        last = eval(heap, env, form);
        if heap.is_error(last) {
            break;
        }
    }
    Ok(last)
}
