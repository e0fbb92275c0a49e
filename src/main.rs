use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use minilisp::{eval, print_value, LispHeap, LispObject, LispParser};

fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut heap = LispHeap::new_stdlib();

    if args.is_empty() {
        repl(&mut heap)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut failures = 0;
    for path in &args {
        let source =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
        let is_test = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with("_test.lisp"))
            .unwrap_or(false);
        if is_test {
            failures += run_test_file(&mut heap, path, &source);
        } else {
            exec(&mut heap, &source);
        }
    }
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn repl(heap: &mut LispHeap) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    let stdin = io::stdin();
    let mut buffer = String::new();
    loop {
        print!("> ");
        stdout.flush().context("failed to flush stdout")?;
        buffer.clear();
        let size = stdin.read_line(&mut buffer)?;
        if size == 0 {
            // eof
            break Ok(());
        }
        if buffer.trim() == "(exit)" {
            break Ok(());
        }
        exec(heap, &buffer);
    }
}

/// Evaluate a batch of top-level forms. Non-nil results print to stdout;
/// an error value prints to stderr (stdout still gets its newline) and
/// abandons the rest of the batch.
fn exec(heap: &mut LispHeap, source: &str) {
    let root = heap.root_env();
    let mut parser = LispParser::new(source);
    loop {
        match parser.next_form(heap) {
            Ok(Some(form)) => {
                let val = eval(heap, root, form);
                if heap.is_error(val) {
                    eprintln!("{}", print_value(heap, val));
                    println!();
                    break;
                }
                if !val.is_nil() {
                    println!("{}", print_value(heap, val));
                }
                heap.maybe_collect();
            }
            Ok(None) => break,
            Err(err) => {
                eprintln!("{}", err);
                println!();
                break;
            }
        }
    }
}

/// Test mode for `*_test.lisp` files: `(deftest name expr)` counts a truthy
/// `expr` as a pass; everything else evaluates normally. Returns the number
/// of failures.
fn run_test_file(heap: &mut LispHeap, path: &str, source: &str) -> usize {
    let root = heap.root_env();
    let mut parser = LispParser::new(source);
    let mut passed = 0;
    let mut failed = 0;
    loop {
        match parser.next_form(heap) {
            Ok(Some(form)) => {
                let head = heap.car(form);
                let is_deftest = matches!(
                    heap.get(head),
                    Some(LispObject::Symbol(s)) if heap.resolve(*s) == "deftest"
                );
                if is_deftest {
                    let rest = heap.cdr(form);
                    let name = heap.car(rest);
                    let body = heap.car(heap.cdr(rest));
                    let val = eval(heap, root, body);
                    if heap.truthy(val) {
                        passed += 1;
                    } else {
                        failed += 1;
                        eprintln!("FAIL {}", print_value(heap, name));
                    }
                } else {
                    let val = eval(heap, root, form);
                    if heap.is_error(val) {
                        eprintln!("{}", print_value(heap, val));
                        println!();
                        break;
                    }
                }
                heap.maybe_collect();
            }
            Ok(None) => break,
            Err(err) => {
                eprintln!("{}", err);
                println!();
                break;
            }
        }
    }
    println!("{}: {} passed, {} failed", path, passed, failed);
    failed
}
