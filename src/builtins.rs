use std::fs;

use crate::env::LispEnv;
use crate::eval::{apply, eval_source, expand_macro_once, expand_macros};
use crate::heap::LispHeap;
use crate::printer::print_value;
use crate::util::{assert_or_err, LispError, Result};
use crate::value::{LispBuiltinFn, LispObject, LispValue};

fn lisp_car(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(heap.car(args[0]))
}

fn lisp_cdr(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(heap.cdr(args[0]))
}

fn lisp_cons(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    Ok(heap.new_cons(args[0], args[1]))
}

fn lisp_setcar(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let cell = heap.expect_cons(args[0])?;
    heap.set_car(cell, args[1]);
    Ok(args[0])
}

fn lisp_setcdr(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let cell = heap.expect_cons(args[0])?;
    heap.set_cdr(cell, args[1]);
    Ok(args[0])
}

fn lisp_list(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    Ok(heap.new_list(args))
}

// fresh spine, shared elements
fn lisp_append(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    let mut items = Vec::new();
    for &arg in args {
        match heap.get(arg) {
            None => {}
            Some(LispObject::Cons(_, _)) => items.extend(heap.list_to_vec(arg)),
            Some(LispObject::Error(msg)) => return Err(LispError::Raised(msg.clone())),
            Some(obj) => return Err(LispError::InvalidDataType("cons", obj.type_of())),
        }
    }
    Ok(heap.new_list(&items))
}

fn lisp_len(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let len = match heap.get(args[0]) {
        None => 0,
        Some(LispObject::Cons(_, _)) => heap.list_to_vec(args[0]).len(),
        Some(LispObject::Error(msg)) => return Err(LispError::Raised(msg.clone())),
        Some(obj) => return Err(LispError::InvalidDataType("cons", obj.type_of())),
    };
    Ok(heap.new_number(len as i64))
}

fn lisp_find(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    for (i, element) in heap.list_to_vec(args[0]).into_iter().enumerate() {
        if heap.equal(element, args[1]) {
            return Ok(heap.new_number(i as i64));
        }
    }
    Ok(LispValue::Nil)
}

fn lisp_last(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(heap
        .list_to_vec(args[0])
        .last()
        .copied()
        .unwrap_or(LispValue::Nil))
}

fn lisp_copy(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(heap.deep_copy(args[0]))
}

fn lisp_type(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let name = heap.type_of(args[0]);
    Ok(heap.new_string(name))
}

// returns the rendering so that `(read (print x))` gives `x` back
fn lisp_print(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let repr = print_value(heap, args[0]);
    println!("{}", repr);
    Ok(heap.new_string(repr))
}

fn lisp_read(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let source = heap.expect_string(args[0])?;
    let mut parser = crate::parser::LispParser::new(&source);
    Ok(parser.next_form(heap)?.unwrap_or(LispValue::Nil))
}

// `(apply f x1 ... xk last)`: a cons `last` splices, anything else lands
// as a final argument; the result of a macro is not re-evaluated
fn lisp_apply(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(!args.is_empty(), LispError::IncorrectArguments(1, 0));
    let f = args[0];
    let mut call_args: Vec<LispValue> = Vec::new();
    if args.len() > 1 {
        call_args.extend_from_slice(&args[1..args.len() - 1]);
        let last = args[args.len() - 1];
        if heap.is_cons(last) {
            call_args.extend(heap.list_to_vec(last));
        } else {
            call_args.push(last);
        }
    }
    Ok(apply(heap, env, f, &call_args))
}

fn lisp_error(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let message = match heap.get(args[0]) {
        Some(LispObject::String(s)) => s.clone(),
        _ => print_value(heap, args[0]),
    };
    Ok(heap.new_error(message))
}

fn lisp_macroexpand_1(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(expand_macro_once(heap, env, args[0]).0)
}

fn lisp_macroexpand(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(expand_macros(heap, env, args[0]))
}

// imported files evaluate in the root scope, like any other library source
fn lisp_import(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let path = heap.expect_string(args[0])?;
    let source = fs::read_to_string(&path)
        .map_err(|err| LispError::ImportFailed(format!("{}: {}", path, err)))?;
    let root = heap.root_env();
    eval_source(heap, root, &source)
}

fn lisp_equal(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let eq = heap.equal(args[0], args[1]);
    Ok(heap.new_bool(eq))
}

fn lisp_lt(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let x = heap.expect_number(args[0])?;
    let y = heap.expect_number(args[1])?;
    Ok(heap.new_bool(x < y))
}

fn lisp_gt(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let x = heap.expect_number(args[0])?;
    let y = heap.expect_number(args[1])?;
    Ok(heap.new_bool(x > y))
}

fn numbers(heap: &LispHeap, args: &[LispValue]) -> Result<Vec<i64>> {
    args.iter().map(|&arg| heap.expect_number(arg)).collect()
}

fn lisp_plus(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(!args.is_empty(), LispError::IncorrectArguments(1, 0));
    let nums = numbers(heap, args)?;
    let sum = nums.iter().fold(0i64, |acc, &n| acc.wrapping_add(n));
    Ok(heap.new_number(sum))
}

fn lisp_minus(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(!args.is_empty(), LispError::IncorrectArguments(1, 0));
    let first = heap.expect_number(args[0])?;
    let rest = numbers(heap, &args[1..])?;
    let sum = rest.iter().fold(0i64, |acc, &n| acc.wrapping_add(n));
    Ok(heap.new_number(first.wrapping_sub(sum)))
}

fn lisp_times(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(!args.is_empty(), LispError::IncorrectArguments(1, 0));
    let nums = numbers(heap, args)?;
    let product = nums.iter().fold(1i64, |acc, &n| acc.wrapping_mul(n));
    Ok(heap.new_number(product))
}

fn lisp_divide(heap: &mut LispHeap, _env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let numerator = heap.expect_number(args[0])?;
    let denominator = heap.expect_number(args[1])?;
    assert_or_err!(denominator != 0, LispError::DivideByZero);
    Ok(heap.new_number(numerator.wrapping_div(denominator)))
}

/// Bind the built-in surface in the root frame.
pub(crate) fn add_builtins(heap: &mut LispHeap) {
    const BUILTINS: &[(&str, LispBuiltinFn)] = &[
        ("car", lisp_car),
        ("cdr", lisp_cdr),
        ("cons", lisp_cons),
        ("setcar", lisp_setcar),
        ("setcdr", lisp_setcdr),
        ("list", lisp_list),
        ("append", lisp_append),
        ("len", lisp_len),
        ("find", lisp_find),
        ("last", lisp_last),
        ("copy", lisp_copy),
        ("type", lisp_type),
        ("print", lisp_print),
        ("read", lisp_read),
        ("apply", lisp_apply),
        ("error", lisp_error),
        ("macroexpand", lisp_macroexpand),
        ("macroexpand-1", lisp_macroexpand_1),
        ("import", lisp_import),
        ("=", lisp_equal),
        ("<", lisp_lt),
        (">", lisp_gt),
        ("+", lisp_plus),
        ("-", lisp_minus),
        ("*", lisp_times),
        ("/", lisp_divide),
    ];
    let root = heap.root_env();
    for &(name, f) in BUILTINS {
        let val = heap.new_builtin_function(name, f);
        let sym = heap.intern_static(name);
        heap.bind(root, sym, val);
    }

    let sym = heap.intern_static("nil");
    heap.bind(root, sym, LispValue::Nil);
    let t = heap.new_bool(true);
    let sym = heap.intern_static("true");
    heap.bind(root, sym, t);
    let f = heap.new_bool(false);
    let sym = heap.intern_static("false");
    heap.bind(root, sym, f);
}
