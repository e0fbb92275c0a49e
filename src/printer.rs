use crate::heap::LispHeap;
use crate::value::{LispCallable, LispObject, LispValue};

/// Render a value the way the REPL prints it. Strings print as their raw
/// bytes without quotes, so the output of atoms and proper lists reads
/// back to an equal value.
pub fn print_value(heap: &LispHeap, val: LispValue) -> String {
    let mut out = String::new();
    write_value(heap, val, &mut out);
    out
}

fn write_value(heap: &LispHeap, val: LispValue, out: &mut String) {
    let obj = match heap.get(val) {
        None => {
            out.push_str("nil");
            return;
        }
        Some(obj) => obj,
    };
    match obj {
        LispObject::Number(n) => out.push_str(&n.to_string()),
        LispObject::Symbol(s) | LispObject::Keyword(s) => out.push_str(heap.resolve(*s)),
        LispObject::String(s) => out.push_str(s),
        LispObject::Bool(true) => out.push_str("true"),
        LispObject::Bool(false) => out.push_str("false"),
        LispObject::Error(msg) => out.push_str(msg),
        LispObject::Callable(c) => {
            if c.is_macro() {
                out.push_str("#<macro>");
            } else {
                out.push_str("#<function>");
            }
        }
        LispObject::Cons(car, cdr) => {
            let (mut car, mut cdr) = (*car, *cdr);
            out.push('(');
            loop {
                write_value(heap, car, out);
                match heap.get(cdr) {
                    None => break,
                    Some(LispObject::Cons(next_car, next_cdr)) => {
                        out.push(' ');
                        car = *next_car;
                        cdr = *next_cdr;
                    }
                    Some(_) => {
                        // improper tail
                        out.push_str(" . ");
                        write_value(heap, cdr, out);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}
