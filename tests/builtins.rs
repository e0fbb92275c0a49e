mod common;
use common::*;

#[test]
fn car_and_cdr() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(car '(1 2 3))"), "1");
    assert_eq!(show(&mut heap, "(cdr '(1 2 3))"), "(2 3)");
    assert_eq!(show(&mut heap, "(cdr '(1))"), "nil");
    // car of a non-cons is nil rather than an error
    assert_eq!(show(&mut heap, "(car 5)"), "nil");
    assert_eq!(show(&mut heap, "(car nil)"), "nil");
}

#[test]
fn cons_builds_pairs_and_lists() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(cons 1 2)"), "(1 . 2)");
    assert_eq!(show(&mut heap, "(cons 1 '(2 3))"), "(1 2 3)");
    assert_eq!(show(&mut heap, "(cons 1 (cons 2 nil))"), "(1 2)");
}

#[test]
fn setcar_and_setcdr_mutate_in_place() {
    let mut heap = testing_heap();
    run(&mut heap, "(define p (cons 1 2))");
    assert_eq!(show(&mut heap, "(setcar p 9)"), "(9 . 2)");
    assert_eq!(show(&mut heap, "(setcdr p nil)"), "(9)");
    assert_eq!(show(&mut heap, "p"), "(9)");
    assert_eq!(show(&mut heap, "(type (setcar 5 1))"), "error");
}

#[test]
fn list_builds_fresh_lists() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(list 1 2 3)"), "(1 2 3)");
    assert_eq!(show(&mut heap, "(list)"), "nil");
}

#[test]
fn append_concatenates() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(append '(1 2) '(3))"), "(1 2 3)");
    assert_eq!(show(&mut heap, "(append nil '(1) nil)"), "(1)");
    assert_eq!(
        show(&mut heap, "(len (append '(1 2) '(3 4 5)))"),
        "5"
    );
    assert_eq!(show(&mut heap, "(type (append '(1) 5))"), "error");
}

#[test]
fn append_leaves_its_arguments_alone() {
    let mut heap = testing_heap();
    run(&mut heap, "(define a '(1 2))");
    run(&mut heap, "(define joined (append a '(3)))");
    run(&mut heap, "(setcar joined 9)");
    assert_eq!(show(&mut heap, "a"), "(1 2)");
}

#[test]
fn len_counts_the_spine() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(len '(1 2 3))"), "3");
    assert_eq!(show(&mut heap, "(len nil)"), "0");
    assert_eq!(show(&mut heap, "(type (len 5))"), "error");
}

#[test]
fn find_returns_an_index_or_nil() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(find '(a b c) 'b)"), "1");
    assert_eq!(show(&mut heap, "(find '(a b c) 'a)"), "0");
    assert_eq!(show(&mut heap, "(find '(a b c) 'z)"), "nil");
    assert_eq!(show(&mut heap, "(find '((1 2) (3 4)) '(3 4))"), "1");
}

#[test]
fn last_returns_the_final_element() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(last '(1 2 3))"), "3");
    assert_eq!(show(&mut heap, "(last nil)"), "nil");
}

#[test]
fn copy_detaches_the_spine() {
    let mut heap = testing_heap();
    run(&mut heap, "(define orig '(1 (2 3)))");
    run(&mut heap, "(define dup (copy orig))");
    run(&mut heap, "(setcar dup 9)");
    assert_eq!(show(&mut heap, "orig"), "(1 (2 3))");
    assert_eq!(show(&mut heap, "dup"), "(9 (2 3))");
    assert_eq!(show(&mut heap, "(= orig (copy orig))"), "true");
}

#[test]
fn type_names_every_variant() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(type 1)"), "number");
    assert_eq!(show(&mut heap, "(type 'a)"), "symbol");
    assert_eq!(show(&mut heap, "(type :k)"), "keyword");
    assert_eq!(show(&mut heap, "(type \"s\")"), "string");
    assert_eq!(show(&mut heap, "(type true)"), "bool");
    assert_eq!(show(&mut heap, "(type (cons 1 2))"), "cons");
    assert_eq!(show(&mut heap, "(type car)"), "function");
    assert_eq!(show(&mut heap, "(type (lambda (x) x))"), "function");
    assert_eq!(show(&mut heap, "(type (macro (x) x))"), "macro");
    assert_eq!(show(&mut heap, "(type nil)"), "nil");
    assert_eq!(show(&mut heap, "(type (error \"e\"))"), "error");
}

#[test]
fn print_returns_what_read_accepts() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(read (print 42))"), "42");
    assert_eq!(show(&mut heap, "(= (read (print '(1 2 3))) '(1 2 3))"), "true");
    assert_eq!(show(&mut heap, "(= (read (print 'sym)) 'sym)"), "true");
}

#[test]
fn apply_splices_a_trailing_list() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(apply + 1 2 '(3 4))"), "10");
    assert_eq!(show(&mut heap, "(apply + 1 2 3)"), "6");
    assert_eq!(show(&mut heap, "(apply list '(1 2))"), "(1 2)");
    assert_eq!(show(&mut heap, "(type (apply nosuch '(1)))"), "error");
}

#[test]
fn error_constructs_an_error_value() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(type (error \"bad\"))"), "error");
    assert_eq!(show(&mut heap, "(error \"bad thing\")"), "bad thing");
}

#[test]
fn equality_is_structural() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(= 1 1)"), "true");
    assert_eq!(show(&mut heap, "(= 1 2)"), "false");
    assert_eq!(show(&mut heap, "(= \"a\" \"a\")"), "true");
    assert_eq!(show(&mut heap, "(= 'a 'a)"), "true");
    assert_eq!(show(&mut heap, "(= '(1 (2 3)) '(1 (2 3)))"), "true");
    assert_eq!(show(&mut heap, "(= '(1 2) '(1 3))"), "false");
    assert_eq!(show(&mut heap, "(= nil nil)"), "true");
    assert_eq!(show(&mut heap, "(= 1 \"1\")"), "false");
}

#[test]
fn callables_compare_by_identity() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(= car car)"), "true");
    assert_eq!(show(&mut heap, "(= car cdr)"), "false");
    assert_eq!(show(&mut heap, "(= (lambda (x) x) (lambda (x) x))"), "false");
}

#[test]
fn arithmetic_folds() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(+ 1 2 3)"), "6");
    assert_eq!(show(&mut heap, "(- 10 2 3)"), "5");
    assert_eq!(show(&mut heap, "(* 2 3 4)"), "24");
    assert_eq!(show(&mut heap, "(/ 7 2)"), "3");
    assert_eq!(show(&mut heap, "(type (/ 1 0))"), "error");
    assert_eq!(show(&mut heap, "(type (+ 1 \"x\"))"), "error");
}

#[test]
fn comparisons() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(< 1 2)"), "true");
    assert_eq!(show(&mut heap, "(> 1 2)"), "false");
    assert_eq!(show(&mut heap, "(> 2 1)"), "true");
}

#[test]
fn an_error_argument_forwards_unchanged() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(+ 1 (error \"boom\"))"), "boom");
    assert_eq!(show(&mut heap, "(type (+ 1 (error \"boom\")))"), "error");
}

#[test]
fn import_failure_is_an_error_value() {
    let mut heap = testing_heap();
    assert_eq!(show(&mut heap, "(type (import \"no/such/file.lisp\"))"), "error");
}
