// ©2024 Otmar Klenk
mod console;
mod data;
mod dictionary;
mod execute;
mod line_reader;
mod number;
mod parser;
mod stack;
mod token;
mod tools;
mod variable;
mod vocabulary;

use std::env;
use std::fmt;
use std::fs::File;

use data::DataHolder;
use execute::Execute;
use parser::Parsing;
use token::Token;

pub(crate) const INIT_FILE: &str = ".CForth";

#[macro_export]
macro_rules! flush {
    () => {{
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }}
}
#[macro_export]
macro_rules! eflush {
    () => {{
        use std::io::Write;
        let _ = std::io::stderr().flush();
    }}
}

/////////////////////////////////////////////////////////////////////////////////////////

/// Failure of the current batch: either a reported error, or one of the two
/// non-local exits. Everything propagates through `?`; only the outermost
/// driver tells them apart.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Error(String),
    Abort,
    Quit,
}

impl Signal {
    #[inline]
    pub(crate) fn error(msg: impl Into<String>) -> Signal {
        Signal::Error(msg.into())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Signal::Error(msg)  => write!(f, "{msg}"),
            Signal::Abort       => write!(f, "ABORT"),
            Signal::Quit        => write!(f, "QUIT"),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

/// Top-level parse loops. LOAD re-enters `parse_file`, so these live on the
/// holder itself rather than on the outer facade.
pub trait Session {
    fn parse_file(&mut self, filename: &str) -> Result<(), Signal>;
    fn parse_line(&mut self, line: &str) -> Result<(), Signal>;
    fn parse_tokens(&mut self) -> Result<(), Signal>;
    fn parse_token(&mut self) -> Result<Option<Token>, Signal>;
}

impl Session for DataHolder {
    fn parse_file(&mut self, filename: &str) -> Result<(), Signal> {
        let Ok(file) = File::open(filename) else {
            return Err(Signal::error(format!("Failed to open '{filename}'")));
        };
        self.reader.push_file(file);
        let rslt = self.parse_tokens();
        self.reader.pop_source();
        rslt?;  // errors and non-local exits leave without the ok
        self.echo_stack();
        println!("ok");
        Ok(())
    }

    fn parse_line(&mut self, line: &str) -> Result<(), Signal> {
        self.reader.push_line(line);
        let rslt = self.parse_tokens();
        self.reader.pop_source();
        match rslt {
            Err(Signal::Abort) | Err(Signal::Quit)  => Ok(()),  // batch abandoned
            Err(err)                                => Err(err),
            Ok(())                                  => {
                self.echo_stack();
                Ok(())
            }
        }
    }

    fn parse_tokens(&mut self) -> Result<(), Signal> {
        loop {
            if ! self.reader.fill_buffer() {
                break;
            }
            let Some(token) = self.parse_token()? else { break; };
            self.exec_token(&token)?;
        }
        Ok(())
    }

    fn parse_token(&mut self) -> Result<Option<Token>, Signal> {
        let Some(word) = self.read_word() else { return Ok(None); };
        let token = self.parse_word(&word)?;
        Ok(Some(token))
    }
}

impl DataHolder {
    // debug rendition of whatever is left on the stack, base 10
    fn echo_stack(&self) {
        if self.is_debug() && ! self.tokens.is_empty() {
            for token in &self.tokens {
                print!("{} ", self.repr10(token));
            }
            println!();
        }
    }

    /// BASE plus the `$HOME/.CForth` startup file; a missing file is silent.
    pub(crate) fn init(&mut self) -> Result<(), Signal> {
        self.define_variable_int("BASE", 10);

        let Ok(home) = env::var("HOME") else { return Ok(()); };
        let path = format!("{home}/{INIT_FILE}");
        let Ok(file) = File::open(&path) else { return Ok(()); };
        self.reader.push_file(file);
        let rslt = self.parse_tokens();
        self.reader.pop_source();
        match rslt {
            Err(Signal::Abort) | Err(Signal::Quit)  => Ok(()),
            other                                   => other,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

pub struct Interpreter {
    dh: DataHolder,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            dh: DataHolder::new(),
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.dh.set_debug(debug);
    }

    pub fn init(&mut self) {
        if let Err(Signal::Error(msg)) = self.dh.init() {
            eprintln!("{msg}");
            eflush!();
        }
    }

    pub fn parse_file(&mut self, filename: &str) -> Result<(), Signal> {
        self.dh.parse_file(filename)
    }

    pub fn parse_line(&mut self, line: &str) -> Result<(), Signal> {
        self.dh.parse_line(line)
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
