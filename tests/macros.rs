mod common;
use common::*;

#[test]
fn quasiquote_without_unquote_is_identity() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "`(a b c)"), "(a b c)");
    assert_eq!(show(&mut heap, "`x"), "x");
    assert_eq!(show(&mut heap, "`7"), "7");
    assert_eq!(show(&mut heap, "(= `(1 (2 3)) '(1 (2 3)))"), "true");
}

#[test]
fn unquote_substitutes_an_evaluation() {
    let mut heap = testing_heap();
    run(&mut heap, "(define c 5)");
    assert_eq!(show(&mut heap, "`(a b ,c)"), "(a b 5)");
    assert_eq!(show(&mut heap, "`(1 (2 ,(+ 1 2)))"), "(1 (2 3))");
    assert_eq!(show(&mut heap, "`,c"), "5");
}

#[test]
fn quasiquote_does_not_mutate_its_template() {
    let mut heap = testing_heap();
    run(&mut heap, "(define c 5)");
    run(&mut heap, "(define make (lambda () `(a ,c)))");
    assert_eq!(show(&mut heap, "(make)"), "(a 5)");
    run(&mut heap, "(define c 6)");
    // the stored template still carries the unquote, not a stale 5
    assert_eq!(show(&mut heap, "(make)"), "(a 6)");
}

#[test]
fn quasiquote_splices_through_the_visible_append() {
    let mut heap = testing_heap();
    run(&mut heap, "(define append (lambda (a b) '(hijacked)))");
    assert_eq!(show(&mut heap, "`(1 2)"), "(hijacked)");
}

#[test]
fn rest_parameter_collects_remaining_arguments() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "((lambda (a b &) &) 1 2 3 4 5)"), "(3 4 5)");
    assert_eq!(show(&mut heap, "((lambda (a &) &) 1)"), "nil");
    assert_eq!(show(&mut heap, "((lambda (&) &) 1 2)"), "(1 2)");
}

#[test]
fn parameters_after_the_rest_marker_are_nil() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "((lambda (a & b) b) 1 2 3)"), "nil");
}

#[test]
fn macros_receive_unevaluated_forms() {
    let mut heap = testing_heap();
    run(&mut heap, "(define the-form (macro (x) `(quote ,x)))");
    assert_eq!(show(&mut heap, "(the-form (+ 1 2))"), "(+ 1 2)");
}

#[test]
fn macro_expansion_evaluates_in_the_caller_scope() {
    let mut heap = testing_heap();
    run(&mut heap, "(define seven (macro () 'x))");
    assert_eq!(show(&mut heap, "(let (x 7) (seven))"), "7");
}

#[test]
fn a_simple_macro_runs() {
    let mut heap = testing_heap();
    run(&mut heap, "(define twice (macro (x) `(+ ,x ,x)))");
    assert_eq!(show(&mut heap, "(twice 21)"), "42");
}

#[test]
fn macroexpand_1_expands_one_layer() {
    let mut heap = testing_heap();
    run(&mut heap, "(define m1 (macro (x) `(m2 ,x)))");
    run(&mut heap, "(define m2 (macro (y) `(+ ,y ,y)))");
    assert_eq!(show(&mut heap, "(macroexpand-1 '(m1 6))"), "(m2 6)");
    assert_eq!(show(&mut heap, "(macroexpand '(m1 6))"), "(+ 6 6)");
}

#[test]
fn macroexpand_leaves_non_macro_forms_alone() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(macroexpand '(+ 1 2))"), "(+ 1 2)");
    assert_eq!(show(&mut heap, "(macroexpand-1 '7)"), "7");
}

#[test]
fn apply_does_not_re_evaluate_a_macro_result() {
    let mut heap = testing_heap();
    run(&mut heap, "(define m1 (macro (x) `(m2 ,x)))");
    run(&mut heap, "(define m2 (macro (y) `(+ ,y ,y)))");
    assert_eq!(show(&mut heap, "(apply m1 '(6))"), "(m2 6)");
}

// a builtin macro sees raw forms and its result is evaluated again
fn lisp_infix(
    heap: &mut LispHeap,
    _env: LispEnv,
    args: &[LispValue],
) -> Result<LispValue> {
    if args.len() != 3 {
        return Err(LispError::IncorrectArguments(3, args.len()));
    }
    Ok(heap.new_list(&[args[1], args[0], args[2]]))
}

#[test]
fn builtin_macros_rewrite_and_re_evaluate() {
    let mut heap = testing_heap();
    let root = heap.root_env();
    let m = heap.new_builtin_macro("infix", lisp_infix);
    let sym = heap.intern("infix");
    heap.bind(root, sym, m);
    assert_eq!(show(&mut heap, "(infix 1 + 2)"), "3");
    assert_eq!(show(&mut heap, "(type infix)"), "macro");
    assert_eq!(show(&mut heap, "(macroexpand-1 '(infix 4 * 5))"), "(* 4 5)");
}
