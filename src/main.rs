// ©2024 Otmar Klenk
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::interpreter::{Interpreter, Signal};

mod interpreter;

const USAGE: &str = "cforth [-debug] [-no_init] [-h|-help] <filenames>";

fn main() {
    let mut debug = false;
    let mut init = true;
    let mut filenames: Vec<String> = vec![];

    for arg in std::env::args().skip(1) {
        if arg.starts_with('-') {
            match arg.as_str() {
                "-debug"        => debug = true,
                "-no_init"      => init = false,
                "-h" | "-help"  => {
                    eprintln!("{USAGE}");
                    std::process::exit(1);
                }
                _               => eprintln!("Invalid arg: {arg}"),
            }
        }
        else {
            filenames.push(arg);
        }
    }

    let mut interpreter = Interpreter::new();
    interpreter.set_debug(debug);
    if init {
        interpreter.init();
    }

    if ! filenames.is_empty() {
        for filename in &filenames {
            if let Err(Signal::Error(msg)) = interpreter.parse_file(filename) {
                eprintln!("{msg}");
            }
        }
    }
    else {
        repl(&mut interpreter);
    }
}

fn repl(interpreter: &mut Interpreter) {
    let Ok(mut rl) = DefaultEditor::new() else {
        eprintln!("Failed to open console");
        return;
    };
    loop {
        match rl.readline("> ") {
            Ok(line)                        => {
                if line == "bye" {
                    break;
                }
                let _ = rl.add_history_entry(line.as_str());
                if let Err(Signal::Error(msg)) = interpreter.parse_line(&line) {
                    eprintln!("{msg}");
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof)         => break,
            Err(err)                        => {
                eprintln!("{err}");
                break;
            }
        }
    }
}
