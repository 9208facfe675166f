use std::env;
use std::fs;
use std::process;

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use docscript::{eval, parse, standard_env, Value};

fn main() {
    env_logger::init();
    match env::args().nth(1) {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

fn run_file(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("docsir: {}: {}", path, e);
            process::exit(1);
        }
    };
    let env = standard_env();
    let expressions = match parse(&source, &env) {
        Ok(expressions) => expressions,
        Err(e) => {
            eprintln!("docsir: {}", e);
            process::exit(1);
        }
    };
    for expression in &expressions {
        debug!("evaluating {}", expression);
        if let Err(e) = eval(expression, &env) {
            eprintln!("docsir: {}", e);
            process::exit(1);
        }
    }
}

fn run_repl() {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("docsir: {}", e);
            process::exit(1);
        }
    };
    let env = standard_env();
    // Lines accumulate here while the parser reports unfinished input.
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { "docsir> " } else { "> " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("docsir: {}", e);
                break;
            }
        };
        let _ = editor.add_history_entry(line.as_str());
        let source = if pending.is_empty() {
            line
        } else {
            format!("{}\n{}", pending, line)
        };
        let expressions = match parse(&source, &env) {
            Ok(expressions) => expressions,
            Err(e) if e.is_unfinished() => {
                debug!("unfinished input, collecting another line: {}", e);
                pending = source;
                continue;
            }
            Err(e) => {
                eprintln!("{}", e);
                pending.clear();
                continue;
            }
        };
        pending.clear();
        for expression in &expressions {
            match eval(expression, &env) {
                Ok(Value::Unspecific) => {}
                Ok(value) => println!("{}", value),
                Err(e) => {
                    eprintln!("{}", e);
                    break;
                }
            }
        }
    }
}
