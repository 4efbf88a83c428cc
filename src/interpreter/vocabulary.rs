// ©2024 Otmar Klenk
#![allow(non_camel_case_types)]

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::flush;

use super::Signal;
use super::Session;
use super::console;
use super::data::{DataHolder, Mode, NO_CURRENT_VARIABLE, STACK_EMPTY};
use super::execute::Execute;
use super::parser::Parsing;
use super::token::{Procedure, Token};
use super::tools::to_upper;

pub(crate) const UNTERMINATED_DO: &str      = "Unterminated DO";
pub(crate) const UNTERMINATED_IF: &str      = "Unterminated IF";
pub(crate) const UNTERMINATED_BEGIN: &str   = "Unterminated BEGIN";
pub(crate) const MISSING_WHILE: &str        = "Missing WHILE";
pub(crate) const MISSING_CHAR: &str         = "Missing char";
pub(crate) const MISSING_WORD: &str         = "Missing word";
pub(crate) const NOT_IN_DO: &str            = "Not in DO";
pub(crate) const NOT_IN_DOUBLE_DO: &str     = "Not in double nested DO";
pub(crate) const UNKNOWN_VARIABLE: &str     = "Unknown variable";
pub(crate) const UNKNOWN_PROCEDURE: &str    = "Unknown procedure";
pub(crate) const UNKNOWN_WORD: &str         = "Unknown word";

/// The fixed operator set, registered under canonical uppercase names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    // stack
    DUP, DROP, SWAP, OVER, ROT, PICK, ROLL, QDUP, DEPTH, POP_RET, PUSH_RET, COPY_RET,
    // comparison
    LESS, EQUAL, GREATER, ULESS, NOT,
    // arithmetic and logical
    PLUS, MINUS, TIMES, DIVIDE, MOD, DMOD, PLUS1, PLUS2, MULDIV, MAX, MIN, ABS, NEGATE,
    AND, OR, XOR,
    // memory
    FETCH, STORE, PFETCH, ADDSTORE, MOVE, FILL,
    // control
    DO, LOOP, ILOOP, I, J, LEAVE, IF, ELSE, THEN, BEGIN, UNTIL, WHILE, REPEAT,
    // input/output
    EMIT, PRINTTO, TYPE, COUNT, TRAILING, KEY, EXPECT, QUERY, WORD,
    // numeric input/output
    DECIMAL, PRINT, PSTACK,
    // mass storage
    LOAD,
    // defining
    DEFINE, VARIABLE, CONSTANT, CREATE, COMMA, DOES, FORGET,
    // compiler
    ALLOT,
    // misc
    COMMENT, HERE, ABORT, QUIT, DEBUG,
}

const ALL: &[BuiltinType] = {
    use BuiltinType::*;
    &[DUP, DROP, SWAP, OVER, ROT, PICK, ROLL, QDUP, DEPTH, POP_RET, PUSH_RET, COPY_RET,
      LESS, EQUAL, GREATER, ULESS, NOT,
      PLUS, MINUS, TIMES, DIVIDE, MOD, DMOD, PLUS1, PLUS2, MULDIV, MAX, MIN, ABS, NEGATE,
      AND, OR, XOR,
      FETCH, STORE, PFETCH, ADDSTORE, MOVE, FILL,
      DO, LOOP, ILOOP, I, J, LEAVE, IF, ELSE, THEN, BEGIN, UNTIL, WHILE, REPEAT,
      EMIT, PRINTTO, TYPE, COUNT, TRAILING, KEY, EXPECT, QUERY, WORD,
      DECIMAL, PRINT, PSTACK,
      LOAD,
      DEFINE, VARIABLE, CONSTANT, CREATE, COMMA, DOES, FORGET,
      ALLOT,
      COMMENT, HERE, ABORT, QUIT, DEBUG]
};

static CORE: Lazy<HashMap<&'static str, BuiltinType>> = Lazy::new(|| {
    let mut core = HashMap::with_capacity(ALL.len());
    for &kind in ALL {
        core.insert(kind.name(), kind);
    }
    core
});

pub(crate) fn lookup_builtin(word: &str) -> Option<BuiltinType> {
    CORE.get(to_upper(word).as_str()).copied()
}

impl BuiltinType {
    pub(crate) fn name(self) -> &'static str {
        match self {
            BuiltinType::DUP        => "DUP",
            BuiltinType::DROP       => "DROP",
            BuiltinType::SWAP       => "SWAP",
            BuiltinType::OVER       => "OVER",
            BuiltinType::ROT        => "ROT",
            BuiltinType::PICK       => "PICK",
            BuiltinType::ROLL       => "ROLL",
            BuiltinType::QDUP       => "?DUP",
            BuiltinType::DEPTH      => "DEPTH",
            BuiltinType::POP_RET    => ">R",
            BuiltinType::PUSH_RET   => "R>",
            BuiltinType::COPY_RET   => "R@",
            BuiltinType::LESS       => "<",
            BuiltinType::EQUAL      => "=",
            BuiltinType::GREATER    => ">",
            BuiltinType::ULESS      => "U<",
            BuiltinType::NOT        => "NOT",
            BuiltinType::PLUS       => "+",
            BuiltinType::MINUS      => "-",
            BuiltinType::TIMES      => "*",
            BuiltinType::DIVIDE     => "/",
            BuiltinType::MOD        => "MOD",
            BuiltinType::DMOD       => "/MOD",
            BuiltinType::PLUS1      => "1+",
            BuiltinType::PLUS2      => "2+",
            BuiltinType::MULDIV     => "*/",
            BuiltinType::MAX        => "MAX",
            BuiltinType::MIN        => "MIN",
            BuiltinType::ABS        => "ABS",
            BuiltinType::NEGATE     => "NEGATE",
            BuiltinType::AND        => "AND",
            BuiltinType::OR         => "OR",
            BuiltinType::XOR        => "XOR",
            BuiltinType::FETCH      => "@",
            BuiltinType::STORE      => "!",
            BuiltinType::PFETCH     => "?",
            BuiltinType::ADDSTORE   => "+!",
            BuiltinType::MOVE       => "MOVE",
            BuiltinType::FILL       => "FILL",
            BuiltinType::DO         => "DO",
            BuiltinType::LOOP       => "LOOP",
            BuiltinType::ILOOP      => "+LOOP",
            BuiltinType::I          => "I",
            BuiltinType::J          => "J",
            BuiltinType::LEAVE      => "LEAVE",
            BuiltinType::IF         => "IF",
            BuiltinType::ELSE       => "ELSE",
            BuiltinType::THEN       => "THEN",
            BuiltinType::BEGIN      => "BEGIN",
            BuiltinType::UNTIL      => "UNTIL",
            BuiltinType::WHILE      => "WHILE",
            BuiltinType::REPEAT     => "REPEAT",
            BuiltinType::EMIT       => "EMIT",
            BuiltinType::PRINTTO    => ".\"",
            BuiltinType::TYPE       => "TYPE",
            BuiltinType::COUNT      => "COUNT",
            BuiltinType::TRAILING   => "-TRAILING",
            BuiltinType::KEY        => "KEY",
            BuiltinType::EXPECT     => "EXPECT",
            BuiltinType::QUERY      => "QUERY",
            BuiltinType::WORD       => "WORD",
            BuiltinType::DECIMAL    => "DECIMAL",
            BuiltinType::PRINT      => ".",
            BuiltinType::PSTACK     => "PSTACK",
            BuiltinType::LOAD       => "LOAD",
            BuiltinType::DEFINE     => ":",
            BuiltinType::VARIABLE   => "VARIABLE",
            BuiltinType::CONSTANT   => "CONSTANT",
            BuiltinType::CREATE     => "CREATE",
            BuiltinType::COMMA      => ",",
            BuiltinType::DOES       => "DOES>",
            BuiltinType::FORGET     => "FORGET",
            BuiltinType::ALLOT      => "ALLOT",
            BuiltinType::COMMENT    => "(",
            BuiltinType::HERE       => "HERE",
            BuiltinType::ABORT      => "ABORT",
            BuiltinType::QUIT       => "QUIT",
            BuiltinType::DEBUG      => "DEBUG",
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DoTokens {
    pub(crate) tokens:      Vec<Token>,
    pub(crate) inc_token:   bool,       // +LOOP pops its increment
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct IfTokens {
    pub(crate) if_tokens:   Vec<Token>,
    pub(crate) else_tokens: Vec<Token>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct BeginTokens {
    pub(crate) tokens:      Vec<Token>,
    pub(crate) while_tokens: Vec<Token>,
    pub(crate) is_until:    bool,
    pub(crate) is_while:    bool,
}

/// Input read at the point the built-in is tokenized; one fresh instance per
/// compile site.
#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    NONE,
    DO(DoTokens),
    IF(IfTokens),
    BEGIN(BeginTokens),
    DOES(Vec<Token>),
    TEXT(String),       // ." and (
    FILENAME(String),   // LOAD
}

#[derive(Clone, Debug, PartialEq)]
pub struct Builtin {
    kind:       BuiltinType,
    modifier:   Modifier,
}

impl Builtin {
    pub(crate) fn new(kind: BuiltinType) -> Self {
        let modifier = match kind {
            BuiltinType::DO                         => Modifier::DO(DoTokens::default()),
            BuiltinType::IF                         => Modifier::IF(IfTokens::default()),
            BuiltinType::BEGIN                      => Modifier::BEGIN(BeginTokens::default()),
            BuiltinType::DOES                       => Modifier::DOES(vec![]),
            BuiltinType::PRINTTO | BuiltinType::COMMENT => Modifier::TEXT(String::new()),
            BuiltinType::LOAD                       => Modifier::FILENAME(String::new()),
            _                                       => Modifier::NONE,
        };
        Self { kind, modifier }
    }

    #[inline(always)]
    pub(crate) fn kind(&self) -> BuiltinType {
        self.kind
    }

    #[inline(always)]
    pub(crate) fn modifier(&self) -> &Modifier {
        &self.modifier
    }

    #[inline(always)]
    pub(crate) fn has_modifier(&self) -> bool {
        ! matches!(self.modifier, Modifier::NONE)
    }

    /// Consume the built-in's extra input at the point it is read. Block
    /// readers run the ordinary resolver, so nesting falls out for free.
    pub(crate) fn read_modifier(&mut self, dh: &mut DataHolder) -> Result<(), Signal> {
        match &mut self.modifier {
            Modifier::DO(d)             => {
                dh.push_mode(Mode::Compile);
                let rslt = read_do_body(dh, d);
                dh.pop_mode();
                rslt
            }
            Modifier::IF(t)             => {
                dh.push_mode(Mode::Compile);
                let rslt = read_if_body(dh, t);
                dh.pop_mode();
                rslt
            }
            Modifier::BEGIN(t)          => {
                dh.push_mode(Mode::Compile);
                let rslt = read_begin_body(dh, t);
                dh.pop_mode();
                rslt
            }
            Modifier::DOES(tokens)      => {
                dh.push_mode(Mode::Compile);
                let rslt = read_does_body(dh, tokens);
                dh.pop_mode();
                rslt
            }
            Modifier::TEXT(text)        => {
                let term = if self.kind == BuiltinType::COMMENT { ')' } else { '"' };
                if ! dh.reader.fill_buffer() {
                    return Err(Signal::error(MISSING_CHAR));
                }
                let line = &mut dh.reader.line;
                text.push(line.get_char());
                while line.is_valid() && ! line.is_char(term) {
                    text.push(line.get_char());
                }
                if line.is_char(term) {
                    line.skip_char();
                }
                Ok(())
            }
            Modifier::FILENAME(filename)    => {
                if ! dh.reader.fill_buffer() {
                    return Err(Signal::error(MISSING_CHAR));
                }
                let Some(word) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
                *filename = word;
                Ok(())
            }
            Modifier::NONE              => Ok(()),
        }
    }

    pub(crate) fn exec(&self, dh: &mut DataHolder) -> Result<(), Signal> {
        match self.kind {
            BuiltinType::DUP        => dh.dup(),
            BuiltinType::DROP       => dh.drop_top(),
            BuiltinType::SWAP       => dh.swap(),
            BuiltinType::OVER       => dh.over(),
            BuiltinType::ROT        => dh.rot(),
            BuiltinType::PICK       => dh.pick(),
            BuiltinType::ROLL       => dh.roll(),
            BuiltinType::QDUP       => dh.qdup(),
            BuiltinType::DEPTH      => dh.depth(),
            BuiltinType::POP_RET    => dh.to_ret(),
            BuiltinType::PUSH_RET   => dh.from_ret(),
            BuiltinType::COPY_RET   => dh.copy_ret(),

            BuiltinType::LESS       => {
                let cmp = dh.cmp_op()?;
                dh.push_boolean(cmp < 0);
                Ok(())
            }
            BuiltinType::EQUAL      => {
                let cmp = dh.cmp_op()?;
                dh.push_boolean(cmp == 0);
                Ok(())
            }
            BuiltinType::GREATER    => {
                let cmp = dh.cmp_op()?;
                dh.push_boolean(cmp > 0);
                Ok(())
            }
            BuiltinType::ULESS      => {
                let cmp = dh.ucmp_op()?;
                dh.push_boolean(cmp < 0);
                Ok(())
            }
            BuiltinType::NOT        => dh.not_op(),

            BuiltinType::PLUS       => dh.plus(),
            BuiltinType::MINUS      => dh.minus(),
            BuiltinType::TIMES      => dh.times(),
            BuiltinType::DIVIDE     => dh.divide(),
            BuiltinType::MOD        => dh.modulo(),
            BuiltinType::DMOD       => dh.dmod(),
            BuiltinType::PLUS1      => dh.plus_n(1),
            BuiltinType::PLUS2      => dh.plus_n(2),
            BuiltinType::MULDIV     => dh.muldiv(),
            BuiltinType::MAX        => dh.max_op(),
            BuiltinType::MIN        => dh.min_op(),
            BuiltinType::ABS        => dh.abs_op(),
            BuiltinType::NEGATE     => dh.negate(),
            BuiltinType::AND        => dh.and_op(),
            BuiltinType::OR         => dh.or_op(),
            BuiltinType::XOR        => dh.xor_op(),

            BuiltinType::FETCH      => dh.fetch(),
            BuiltinType::STORE      => dh.store(),
            BuiltinType::PFETCH     => dh.pfetch(),
            BuiltinType::ADDSTORE   => dh.add_store(),
            BuiltinType::MOVE       => dh.move_cells(),
            BuiltinType::FILL       => dh.fill_cells(),

            BuiltinType::DO         => {
                let Modifier::DO(d) = &self.modifier else { unreachable!() };
                dh.looping(d)
            }
            BuiltinType::IF         => {
                let Modifier::IF(t) = &self.modifier else { unreachable!() };
                dh.forking(t)
            }
            BuiltinType::BEGIN      => {
                let Modifier::BEGIN(t) = &self.modifier else { unreachable!() };
                dh.repeating(t)
            }
            // block terminators; recognized by the block readers, inert here
            BuiltinType::LOOP | BuiltinType::ILOOP | BuiltinType::ELSE | BuiltinType::THEN
            | BuiltinType::UNTIL | BuiltinType::WHILE | BuiltinType::REPEAT => Ok(()),
            BuiltinType::I          => {
                let n = dh.ret_tokens.len();
                if n < 2 {
                    return Err(Signal::error(NOT_IN_DO));
                }
                let token = dh.ret_tokens[n - 2].clone();
                dh.push_token(token);
                Ok(())
            }
            BuiltinType::J          => {
                let n = dh.ret_tokens.len();
                if n < 4 {
                    return Err(Signal::error(NOT_IN_DOUBLE_DO));
                }
                let token = dh.ret_tokens[n - 4].clone();
                dh.push_token(token);
                Ok(())
            }
            BuiltinType::LEAVE      => dh.leave(),

            BuiltinType::EMIT       => {
                let n = dh.pop_number()?;
                print!("{}", (n.integer() as u8) as char);
                flush!();
                Ok(())
            }
            BuiltinType::PRINTTO    => {
                let Modifier::TEXT(text) = &self.modifier else { unreachable!() };
                print!("{text}");
                flush!();
                Ok(())
            }
            BuiltinType::TYPE       => type_out(dh),
            BuiltinType::COUNT      => count(dh),
            BuiltinType::TRAILING   => trailing(dh),
            BuiltinType::KEY        => {
                let c = console::getch().map_err(Signal::error)?;
                dh.push_integer(c);
                Ok(())
            }
            BuiltinType::EXPECT     => expect(dh),
            BuiltinType::QUERY      => query(dh),
            BuiltinType::WORD       => word_in(dh),

            BuiltinType::DECIMAL    => {
                match dh.dictionary.find_variable("BASE") {
                    Some(id)    => {
                        dh.vars[id].set_integer(10);
                    }
                    None        => {
                        dh.define_variable_int("BASE", 10);
                    }
                }
                Ok(())
            }
            BuiltinType::PRINT      => dh.dot(),
            BuiltinType::PSTACK     => {
                dh.pstack();
                Ok(())
            }

            BuiltinType::LOAD       => {
                let Modifier::FILENAME(filename) = &self.modifier else { unreachable!() };
                dh.parse_file(filename)
            }

            BuiltinType::DEFINE     => {
                dh.push_mode(Mode::Compile);
                let rslt = define_word(dh);
                dh.defining = None;
                dh.pop_mode();
                rslt
            }
            BuiltinType::VARIABLE   => {
                let Some(name) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
                let id = dh.define_variable_int(&name, 0);
                dh.current_var = Some(id);
                Ok(())
            }
            BuiltinType::CONSTANT   => {
                let token = dh.pop_token()?;
                let Some(name) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
                let id = dh.define_variable_with(&name, token);
                dh.vars[id].set_constant(true);
                Ok(())
            }
            BuiltinType::CREATE     => {
                let Some(name) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
                let id = dh.define_variable(&name);
                dh.current_var = Some(id);
                Ok(())
            }
            BuiltinType::COMMA      => {
                let Some(token) = dh.tokens.pop() else { return Err(Signal::error(STACK_EMPTY)); };
                let Some(id) = dh.current_var else { return Err(Signal::error(NO_CURRENT_VARIABLE)); };
                dh.trace("Comma", &token);
                dh.vars[id].add_value(token);
                Ok(())
            }
            BuiltinType::DOES       => {
                let Modifier::DOES(tokens) = &self.modifier else { unreachable!() };
                let Some(id) = dh.current_var else { return Err(Signal::error(NO_CURRENT_VARIABLE)); };
                dh.vars[id].set_exec_tokens(tokens.clone());
                Ok(())
            }
            BuiltinType::FORGET     => forget(dh),

            BuiltinType::ALLOT      => {
                let n = dh.pop_number()?;
                let Some(id) = dh.current_var else { return Err(Signal::error(NO_CURRENT_VARIABLE)); };
                dh.vars[id].allot(n.integer());
                Ok(())
            }

            BuiltinType::COMMENT    => Ok(()),
            BuiltinType::HERE       => {
                let id = dh.word_var();
                dh.push_token(Token::VARIABLE(id));
                Ok(())
            }
            BuiltinType::ABORT      => {
                dh.clear_ret_tokens();
                dh.clear_exec_blocks();
                dh.clear_tokens();
                Err(Signal::Abort)
            }
            BuiltinType::QUIT       => {
                dh.clear_ret_tokens();
                dh.clear_exec_blocks();
                Err(Signal::Quit)
            }
            BuiltinType::DEBUG      => {
                let n = dh.pop_number()?;
                dh.set_debug(n.integer() != 0);
                Ok(())
            }
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

fn read_do_body(dh: &mut DataHolder, d: &mut DoTokens) -> Result<(), Signal> {
    loop {
        let Some(word) = dh.read_word() else { return Err(Signal::error(UNTERMINATED_DO)); };
        match to_upper(&word).as_str() {
            "LOOP"  => return Ok(()),
            "+LOOP" => {
                d.inc_token = true;
                return Ok(());
            }
            _       => {
                let token = dh.parse_word(&word)?;
                dh.add_block_token(&mut d.tokens, token);
            }
        }
    }
}

fn read_if_body(dh: &mut DataHolder, t: &mut IfTokens) -> Result<(), Signal> {
    let mut in_else = false;
    loop {
        let Some(word) = dh.read_word() else { return Err(Signal::error(UNTERMINATED_IF)); };
        match to_upper(&word).as_str() {
            "ELSE"  => {
                in_else = true;
            }
            "THEN"  => return Ok(()),
            _       => {
                let token = dh.parse_word(&word)?;
                let target = if in_else { &mut t.else_tokens } else { &mut t.if_tokens };
                dh.add_block_token(target, token);
            }
        }
    }
}

fn read_begin_body(dh: &mut DataHolder, t: &mut BeginTokens) -> Result<(), Signal> {
    loop {
        let Some(word) = dh.read_word() else { return Err(Signal::error(UNTERMINATED_BEGIN)); };
        match to_upper(&word).as_str() {
            "UNTIL"     => {
                t.is_until = true;
                t.is_while = false;
                return Ok(());
            }
            "REPEAT"    => {
                if ! t.is_while {
                    return Err(Signal::error(MISSING_WHILE));
                }
                return Ok(());
            }
            "WHILE"     => {
                t.is_until = false;
                t.is_while = true;
                t.while_tokens = std::mem::take(&mut t.tokens);
            }
            _           => {
                let token = dh.parse_word(&word)?;
                dh.add_block_token(&mut t.tokens, token);
            }
        }
    }
}

// terminated by peeking the enclosing definition's ';' without consuming it
fn read_does_body(dh: &mut DataHolder, tokens: &mut Vec<Token>) -> Result<(), Signal> {
    loop {
        if ! dh.reader.fill_buffer() {
            return Err(Signal::error(MISSING_CHAR));
        }
        let pos = dh.reader.line.pos();
        let Some(word) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
        if word == ";" {
            dh.reader.line.set_pos(pos);
            return Ok(());
        }
        let token = dh.parse_word(&word)?;
        dh.add_block_token(tokens, token);
    }
}

fn define_word(dh: &mut DataHolder) -> Result<(), Signal> {
    let Some(name) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
    let proc_id = dh.procs.len();
    dh.procs.push(Procedure::new(&name));
    dh.defining = Some((name.clone(), proc_id));

    let mut tokens = vec![];
    loop {
        let Some(word) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
        if word == ";" {
            break;
        }
        let token = dh.parse_word(&word)?;
        dh.add_block_token(&mut tokens, token);
    }
    dh.procs[proc_id].tokens = tokens;
    dh.dictionary.ins_procedure(&name, proc_id);
    if dh.is_debug() {
        println!("Define Procedure: {}", dh.repr10(&Token::PROCEDURE(proc_id)));
    }
    Ok(())
}

fn forget(dh: &mut DataHolder) -> Result<(), Signal> {
    let Some(word) = dh.read_word() else { return Err(Signal::error(MISSING_WORD)); };
    if dh.dictionary.find_variable(&word).is_some() {
        if ! dh.dictionary.forget_variable(&word) {
            return Err(Signal::error(UNKNOWN_VARIABLE));
        }
        if dh.is_debug() {
            println!("Forget Var: {word}");
        }
    }
    else if dh.dictionary.find_procedure(&word).is_some() {
        if ! dh.dictionary.forget_procedure(&word) {
            return Err(Signal::error(UNKNOWN_PROCEDURE));
        }
        if dh.is_debug() {
            println!("Forget Procedure: {word}");
        }
    }
    else {
        return Err(Signal::error(UNKNOWN_WORD));
    }
    Ok(())
}

fn type_out(dh: &mut DataHolder) -> Result<(), Signal> {
    let n = dh.pop_number()?;
    let target = dh.pop_var_ref()?;
    for i in 0..n.integer() {
        if let Some(Token::NUMBER(num)) = dh.ref_ind_value(&target, i) {
            print!("{}", (num.integer() as u8) as char);
        }
    }
    flush!();
    Ok(())
}

fn count(dh: &mut DataHolder) -> Result<(), Signal> {
    let target = dh.pop_var_ref()?;
    match target.index_var(1, &dh.vars) {
        Some(r) => dh.push_token(r),
        None    => unreachable!(),
    }
    let length = dh.ref_value(&target)?;
    dh.push_token(length);
    Ok(())
}

fn trailing(dh: &mut DataHolder) -> Result<(), Signal> {
    let n = dh.pop_number()?;
    let target = dh.pop_var_ref()?;
    let mut i = n.integer() - 1;
    while i >= 0 {
        let Some(Token::NUMBER(num)) = dh.ref_ind_value(&target, i) else { break; };
        if ! ((num.integer() as u8) as char).is_whitespace() {
            break;
        }
        i -= 1;
    }
    dh.push_token(target);
    dh.push_integer(i + 1);
    Ok(())
}

fn expect(dh: &mut DataHolder) -> Result<(), Signal> {
    let n = dh.pop_number()?;
    let target = dh.pop_var_ref()?;
    for i in 0..n.integer() {
        let Some(c) = console::read_char() else { break; };
        if c == '\n' {
            break;
        }
        dh.set_ref_ind_value(&target, i, Token::from(c as i64));
    }
    Ok(())
}

fn query(dh: &mut DataHolder) -> Result<(), Signal> {
    let mut str = String::new();
    for _ in 0..80 {
        let Some(c) = console::read_char() else { break; };
        if ! str.is_empty() && c == '\n' {
            break;
        }
        str.push(c);
    }
    dh.reader.line.insert(&str);
    Ok(())
}

/// Read up to a popped terminator character and store the text into the WORD
/// scratch as a counted string: cell 0 the length, cells 1.. the characters.
fn word_in(dh: &mut DataHolder) -> Result<(), Signal> {
    let word_id = dh.word_var();
    let n = dh.pop_number()?;
    if ! dh.reader.fill_buffer() {
        return Err(Signal::error(MISSING_CHAR));
    }
    let last_c = (n.integer() as u8) as char;
    let line = &mut dh.reader.line;
    let mut str = String::new();
    str.push(line.get_char());
    while line.is_valid() && ! line.is_char(last_c) {
        str.push(line.get_char());
    }
    if line.is_char(last_c) {
        line.get_char();
    }
    if dh.is_debug() {
        println!("Word: '{str}'");
    }
    let len = str.chars().count() as i64;
    if dh.vars[word_id].length() < len + 1 {
        let need = len + 1 - dh.vars[word_id].length();
        dh.vars[word_id].allot(need);
    }
    dh.vars[word_id].set_ind_value(0, Token::from(len));
    for (i, c) in str.chars().enumerate() {
        dh.vars[word_id].set_ind_value(i as i64 + 1, Token::from(c as i64));
    }
    dh.push_token(Token::VARIABLE(word_id));
    Ok(())
}

/////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup_builtin("dup"), Some(BuiltinType::DUP));
        assert_eq!(lookup_builtin("Dup"), Some(BuiltinType::DUP));
        assert_eq!(lookup_builtin("+"), Some(BuiltinType::PLUS));
        assert_eq!(lookup_builtin(".\""), Some(BuiltinType::PRINTTO));
        assert_eq!(lookup_builtin(";"), None);
        assert_eq!(lookup_builtin("nosuch"), None);
    }

    #[test]
    fn every_builtin_is_registered_once() {
        assert_eq!(CORE.len(), ALL.len());
    }

    #[test]
    fn modifier_kinds_follow_the_builtin() {
        assert!(Builtin::new(BuiltinType::DO).has_modifier());
        assert!(Builtin::new(BuiltinType::IF).has_modifier());
        assert!(Builtin::new(BuiltinType::BEGIN).has_modifier());
        assert!(Builtin::new(BuiltinType::DOES).has_modifier());
        assert!(Builtin::new(BuiltinType::PRINTTO).has_modifier());
        assert!(Builtin::new(BuiltinType::COMMENT).has_modifier());
        assert!(Builtin::new(BuiltinType::LOAD).has_modifier());
        assert!(! Builtin::new(BuiltinType::WORD).has_modifier());
        assert!(! Builtin::new(BuiltinType::DUP).has_modifier());
    }

    #[test]
    fn comma_and_allot_need_a_current_variable() {
        let mut dh = DataHolder::new();
        dh.push_integer(1);
        let comma = Builtin::new(BuiltinType::COMMA);
        assert_eq!(comma.exec(&mut dh), Err(Signal::error(NO_CURRENT_VARIABLE)));
        dh.push_integer(1);
        let allot = Builtin::new(BuiltinType::ALLOT);
        assert_eq!(allot.exec(&mut dh), Err(Signal::error(NO_CURRENT_VARIABLE)));
    }

    #[test]
    fn abort_clears_more_than_quit() {
        let mut dh = DataHolder::new();
        dh.push_integer(1);
        dh.ret_tokens.push(Token::from(2));
        let quit = Builtin::new(BuiltinType::QUIT);
        assert_eq!(quit.exec(&mut dh), Err(Signal::Quit));
        assert_eq!(dh.tokens.len(), 1);
        assert!(dh.ret_tokens.is_empty());

        dh.ret_tokens.push(Token::from(2));
        let abort = Builtin::new(BuiltinType::ABORT);
        assert_eq!(abort.exec(&mut dh), Err(Signal::Abort));
        assert!(dh.tokens.is_empty());
        assert!(dh.ret_tokens.is_empty());
    }
}
