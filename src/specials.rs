use itertools::Itertools;
use phf::phf_map;

use crate::env::LispEnv;
use crate::eval::eval;
use crate::heap::LispHeap;
use crate::util::{assert_or_err, LispError, Result};
use crate::value::{LispFunc, LispObject, LispValue};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum LispSpecialForm {
    Quote,
    Quasiquote,
    Unquote,
    Eval,
    Define,
    Set,
    Let,
    If,
    Do,
    Lambda,
    Macro,
}

static SPECIAL_FORMS: phf::Map<&'static str, LispSpecialForm> = phf_map! {
    "quote" => LispSpecialForm::Quote,
    "quasiquote" => LispSpecialForm::Quasiquote,
    "unquote" => LispSpecialForm::Unquote,
    "eval" => LispSpecialForm::Eval,
    "define" => LispSpecialForm::Define,
    "set" => LispSpecialForm::Set,
    "let" => LispSpecialForm::Let,
    "if" => LispSpecialForm::If,
    "do" => LispSpecialForm::Do,
    "lambda" => LispSpecialForm::Lambda,
    "macro" => LispSpecialForm::Macro,
};

pub(crate) fn special_form(name: &str) -> Option<LispSpecialForm> {
    SPECIAL_FORMS.get(name).copied()
}

/// Run one special form against its unevaluated argument forms. Failures
/// surface as error values, never as Rust-level errors.
pub(crate) fn eval_special(
    heap: &mut LispHeap,
    env: LispEnv,
    form: LispSpecialForm,
    args: &[LispValue],
) -> LispValue {
    let out = match form {
        LispSpecialForm::Quote => eval_quote(args),
        LispSpecialForm::Quasiquote => eval_quasiquote(heap, env, args),
        LispSpecialForm::Unquote => Err(LispError::OnlyInQuasiquote),
        LispSpecialForm::Eval => eval_eval(heap, env, args),
        LispSpecialForm::Define => eval_define(heap, env, args),
        LispSpecialForm::Set => eval_set(heap, env, args),
        LispSpecialForm::Let => eval_let(heap, env, args),
        LispSpecialForm::If => eval_if(heap, env, args),
        LispSpecialForm::Do => eval_do(heap, env, args),
        LispSpecialForm::Lambda => eval_lambda(heap, env, args, false),
        LispSpecialForm::Macro => eval_lambda(heap, env, args, true),
    };
    out.unwrap_or_else(|err| heap.new_error(err.to_string()))
}

fn eval_quote(args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(args[0])
}

fn eval_quasiquote(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    Ok(quasiquote(heap, env, args[0]))
}

fn eval_eval(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 1, LispError::IncorrectArguments(1, args.len()));
    let val = eval(heap, env, args[0]);
    if heap.is_error(val) {
        return Ok(val);
    }
    Ok(eval(heap, env, val))
}

fn eval_define(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let name = heap.expect_symbol(args[0])?;
    let val = eval(heap, env, args[1]);
    if heap.is_error(val) {
        return Ok(val);
    }
    heap.bind_root(env, name, val);
    Ok(LispValue::Nil)
}

// `(set name value)` or `(set (n1 v1) (n2 v2) ...)`; assignment updates an
// existing binding wherever it lives on the chain
fn eval_set(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(!args.is_empty(), LispError::IncorrectArguments(2, 0));
    if matches!(heap.get(args[0]), Some(LispObject::Symbol(_))) {
        assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
        let name = heap.expect_symbol(args[0])?;
        let val = eval(heap, env, args[1]);
        if heap.is_error(val) {
            return Ok(val);
        }
        heap.assign(env, name, val);
        return Ok(LispValue::Nil);
    }
    for &pair in args {
        let parts = heap.list_to_vec(pair);
        assert_or_err!(parts.len() == 2, LispError::MissingBinding);
        let name = heap.expect_symbol(parts[0])?;
        let val = eval(heap, env, parts[1]);
        if heap.is_error(val) {
            return Ok(val);
        }
        heap.assign(env, name, val);
    }
    Ok(LispValue::Nil)
}

// binding values evaluate in the enclosing scope, the body in the child
fn eval_let(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let bindings = heap.list_to_vec(args[0]);
    assert_or_err!(bindings.len() % 2 == 0, LispError::MissingBinding);
    let child = heap.new_frame(Some(env));
    for (name_form, val_form) in bindings.into_iter().tuples() {
        let name = heap.expect_symbol(name_form)?;
        let val = eval(heap, env, val_form);
        if heap.is_error(val) {
            return Ok(val);
        }
        heap.bind(child, name, val);
    }
    Ok(eval(heap, child, args[1]))
}

fn eval_if(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    assert_or_err!(
        args.len() > 1 && args.len() < 4,
        LispError::IncorrectArguments(2, args.len()),
    );
    let pred = eval(heap, env, args[0]);
    if heap.truthy(pred) {
        Ok(eval(heap, env, args[1]))
    } else if args.len() == 3 {
        Ok(eval(heap, env, args[2]))
    } else {
        Ok(LispValue::Nil)
    }
}

fn eval_do(heap: &mut LispHeap, env: LispEnv, args: &[LispValue]) -> Result<LispValue> {
    let mut last = LispValue::Nil;
    for &form in args {
        last = eval(heap, env, form);
        if heap.is_error(last) {
            break;
        }
    }
    Ok(last)
}

// the captured scope is a fresh child of the defining scope, so bindings
// made into it later (mutual recursion) stay visible
fn eval_lambda(
    heap: &mut LispHeap,
    env: LispEnv,
    args: &[LispValue],
    is_macro: bool,
) -> Result<LispValue> {
    assert_or_err!(args.len() == 2, LispError::IncorrectArguments(2, args.len()));
    let param_forms = heap.list_to_vec(args[0]);
    let params = param_forms
        .into_iter()
        .map(|form| heap.expect_symbol(form))
        .collect::<Result<Vec<_>>>()?;
    let amp = heap.intern_static("&");
    let rest_index = params.iter().position(|&p| p == amp);
    let closure = heap.new_frame(Some(env));
    let func = LispFunc::new(params, rest_index, args[1], closure);
    Ok(if is_macro {
        heap.new_user_macro(func)
    } else {
        heap.new_user_function(func)
    })
}

/// Quasiquote: deep-copy the template spine, rewrite each `(unquote x)`
/// cell in place with the evaluation of `x`, then splice the elements
/// through a synthesised `(append (list (quote e)) ...)` form. Going
/// through `append`/`list` keeps user redefinitions of those names
/// effective inside templates.
pub(crate) fn quasiquote(heap: &mut LispHeap, env: LispEnv, template: LispValue) -> LispValue {
    if let Some(arg) = unquote_arg(heap, template) {
        return eval(heap, env, arg);
    }
    if !heap.is_cons(template) {
        return template;
    }
    let copy = heap.deep_copy(template);
    rewrite_unquotes(heap, env, copy);

    let quote = heap.new_symbol("quote");
    let list = heap.new_symbol("list");
    let mut parts = vec![heap.new_symbol("append")];
    for element in heap.list_to_vec(copy) {
        let quoted = heap.new_list(&[quote, element]);
        parts.push(heap.new_list(&[list, quoted]));
    }
    let synthetic = heap.new_list(&parts);
    eval(heap, env, synthetic)
}

fn unquote_arg(heap: &LispHeap, val: LispValue) -> Option<LispValue> {
    match heap.get(val) {
        Some(LispObject::Cons(car, cdr)) => match heap.get(*car) {
            Some(LispObject::Symbol(s)) if heap.resolve(*s) == "unquote" => {
                Some(heap.car(*cdr))
            }
            _ => None,
        },
        _ => None,
    }
}

// walk the copied spine; mutation never reaches the original template
fn rewrite_unquotes(heap: &mut LispHeap, env: LispEnv, spine: LispValue) {
    let mut cur = spine;
    while let Some(LispObject::Cons(car, cdr)) = heap.get(cur) {
        let (car, cdr) = (*car, *cdr);
        let LispValue::Object(cell) = cur else { unreachable!() };
        if let Some(arg) = unquote_arg(heap, car) {
            let val = eval(heap, env, arg);
            heap.set_car(cell, val);
        } else if heap.is_cons(car) {
            rewrite_unquotes(heap, env, car);
        }
        cur = cdr;
    }
}
