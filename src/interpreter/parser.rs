// ©2024 Otmar Klenk
use std::str::FromStr;

use super::Signal;
use super::data::DataHolder;
use super::line_reader::Line;
use super::number::Number;
use super::token::Token;
use super::tools::{is_base_char, to_base_integer, OVERFLOW};
use super::vocabulary::{lookup_builtin, Builtin};

pub(crate) const NOT_A_NUMBER: &str = "Not a number";

pub trait Parsing {
    fn read_word(&mut self) -> Option<String>;
    fn parse_word(&mut self, word: &str) -> Result<Token, Signal>;
    fn read_number_token(&self, word: &str) -> Result<Token, Signal>;
    fn add_block_token(&self, tokens: &mut Vec<Token>, token: Token);
}

impl Parsing for DataHolder {
    /// One whitespace-delimited run of characters, trailing whitespace eaten.
    fn read_word(&mut self) -> Option<String> {
        if ! self.reader.fill_buffer() {
            return None;
        }
        let line = &mut self.reader.line;
        let mut word = String::new();
        word.push(line.get_char());
        while line.is_valid() && ! line.is_space() {
            word.push(line.get_char());
        }
        while line.is_valid() && line.is_space() {
            line.skip_char();
        }
        Some(word)
    }

    /// Resolution order: variable, procedure, the definition under
    /// construction, built-in, number. A constant resolves to its value; a
    /// built-in with a modifier reads its extra input here and now.
    fn parse_word(&mut self, word: &str) -> Result<Token, Signal> {
        if let Some(id) = self.dictionary.find_variable(word) {
            if self.vars[id].is_constant() {
                if let Some(value) = self.vars[id].value() {
                    return Ok(value.clone());
                }
            }
            return Ok(Token::VARIABLE(id));
        }
        if let Some(id) = self.dictionary.find_procedure(word) {
            return Ok(Token::PROCEDURE(id));
        }
        if let Some((name, id)) = &self.defining {
            if name == word {
                return Ok(Token::PROCEDURE(*id));
            }
        }
        if let Some(kind) = lookup_builtin(word) {
            let mut builtin = Builtin::new(kind);
            if builtin.has_modifier() {
                builtin.read_modifier(self)?;
            }
            return Ok(Token::BUILTIN(builtin));
        }
        match self.read_number_token(word) {
            Ok(token)                                   => Ok(token),
            Err(Signal::Error(msg)) if msg == OVERFLOW  => Err(Signal::error(OVERFLOW)),
            Err(_)                                      => Err(Signal::error(format!("{word} ?"))),
        }
    }

    /// Grammar under the current BASE: sign, base digits, optional fraction,
    /// optional exponent. Any trailing character rewinds and rejects. Real
    /// syntax is only accepted in base 10.
    fn read_number_token(&self, word: &str) -> Result<Token, Signal> {
        let mut line = Line::new(word);
        let base = self.get_base();
        let pos = line.pos();

        let mut str = String::new();
        let mut sign = 1i64;
        if line.is_one_of("+-") {
            sign = if line.get_char() == '-' { -1 } else { 1 };
        }

        if is_base_char(line.look_char(), base).is_none() {
            line.set_pos(pos);
            return Err(Signal::error(NOT_A_NUMBER));
        }
        while line.is_valid() && is_base_char(line.look_char(), base).is_some() {
            str.push(line.get_char());
        }

        let mut real = false;
        if line.is_valid() && line.is_char('.') {
            real = true;
            str.push(line.get_char());
            while line.is_valid() && is_base_char(line.look_char(), base).is_some() {
                str.push(line.get_char());
            }
        }
        if line.is_valid() && line.is_one_of("Ee") {
            if is_base_char(line.look_next_char(1), base).is_some() {
                real = true;
                str.push(line.get_char());
                while line.is_valid() && is_base_char(line.look_char(), base).is_some() {
                    str.push(line.get_char());
                }
            }
        }

        if line.is_valid() && ! line.is_space() {
            line.set_pos(pos);
            return Err(Signal::error(NOT_A_NUMBER));
        }

        if ! real {
            let il = match to_base_integer(&str, base) {
                Ok(il)      => il,
                Err(msg)    => {
                    line.set_pos(pos);
                    return Err(Signal::error(msg));
                }
            };
            let i = sign * il;
            if i > i32::MAX as i64 || i < i32::MIN as i64 {
                line.set_pos(pos);
                return Err(Signal::error(OVERFLOW));
            }
            Ok(Token::from(i))
        }
        else {
            if base != 10 {
                line.set_pos(pos);
                return Err(Signal::error(NOT_A_NUMBER));
            }
            match f64::from_str(&str) {
                Ok(r)   => Ok(Token::NUMBER(Number::REAL(sign as f64 * r))),
                Err(_)  => {
                    line.set_pos(pos);
                    Err(Signal::error(NOT_A_NUMBER))
                }
            }
        }
    }

    /// Compile helper: procedures are flattened into the block (except the
    /// definition under construction, kept as a call so recursion works);
    /// null tokens such as parsed comments are discarded.
    fn add_block_token(&self, tokens: &mut Vec<Token>, token: Token) {
        match &token {
            Token::PROCEDURE(id)    => {
                if let Some((_, def_id)) = &self.defining {
                    if id == def_id {
                        tokens.push(token);
                        return;
                    }
                }
                tokens.extend(self.procs[*id].tokens.iter().cloned());
            }
            t if t.is_null()        => {}
            _                       => tokens.push(token),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
