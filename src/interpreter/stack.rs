// ©2024 Otmar Klenk
use crate::flush;

use super::Signal;
use super::data::DataHolder;
use super::token::Token;
use super::tools::to_base_string;
use super::vocabulary::{Builtin, BuiltinType, Modifier};

impl DataHolder {
    /// Rendition under the current BASE.
    pub(crate) fn repr(&self, token: &Token) -> String {
        self.token_repr(token, false, true)
    }

    /// Rendition pinned to base 10, for debug traces.
    pub(crate) fn repr10(&self, token: &Token) -> String {
        self.token_repr(token, true, true)
    }

    fn token_repr(&self, token: &Token, ignore_base: bool, expand: bool) -> String {
        match token {
            Token::BOOL(b)              => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Token::NUMBER(n)            => {
                let base = if ignore_base { 10 } else { self.get_base() };
                if base != 10 && n.is_integer() {
                    to_base_string(base, n.integer())
                }
                else {
                    n.to_string()
                }
            }
            Token::BUILTIN(b)           => self.builtin_repr(b, ignore_base),
            Token::VARIABLE(id)         => {
                let var = &self.vars[*id];
                if var.is_constant() {
                    if let Some(value) = var.value() {
                        return self.token_repr(value, ignore_base, false);
                    }
                }
                format!("${}", var.name())
            }
            Token::VAR_REF { var, ind } => {
                let base = self.token_repr(&Token::VARIABLE(*var), ignore_base, false);
                format!("{base}[{ind}]")
            }
            Token::PROCEDURE(id)        => {
                let proc = &self.procs[*id];
                if ! expand {
                    return proc.name().to_string();
                }
                format!(": {} {};", proc.name(), self.body_repr(&proc.tokens, ignore_base))
            }
        }
    }

    // each token followed by a blank, nested procedures by name only
    fn body_repr(&self, tokens: &[Token], ignore_base: bool) -> String {
        let mut rslt = String::new();
        for token in tokens {
            rslt += &self.token_repr(token, ignore_base, false);
            rslt += " ";
        }
        rslt
    }

    fn builtin_repr(&self, b: &Builtin, ignore_base: bool) -> String {
        match b.modifier() {
            Modifier::DO(d)             => {
                let end = if d.inc_token { "+LOOP" } else { "LOOP" };
                format!("DO {}{end}", self.body_repr(&d.tokens, ignore_base))
            }
            Modifier::IF(t)             => {
                if t.else_tokens.is_empty() {
                    format!("IF {}THEN", self.body_repr(&t.if_tokens, ignore_base))
                }
                else {
                    format!("IF {}ELSE {}THEN",
                            self.body_repr(&t.if_tokens, ignore_base),
                            self.body_repr(&t.else_tokens, ignore_base))
                }
            }
            Modifier::BEGIN(t)          => {
                if t.is_until {
                    format!("BEGIN {}UNTIL", self.body_repr(&t.tokens, ignore_base))
                }
                else {
                    format!("BEGIN {}WHILE {}REPEAT",
                            self.body_repr(&t.while_tokens, ignore_base),
                            self.body_repr(&t.tokens, ignore_base))
                }
            }
            Modifier::DOES(tokens)      => {
                format!("DOES> {}", self.body_repr(tokens, ignore_base))
            }
            Modifier::TEXT(text)        => {
                if b.kind() == BuiltinType::COMMENT {
                    format!("( {text})")
                }
                else {
                    format!(".\" {text}\"")
                }
            }
            Modifier::FILENAME(f)       => format!("LOAD \"{f}\""),
            Modifier::NONE              => b.kind().name().to_string(),
        }
    }

/////////////////////////////////////////////////////////////////////////////////////////

    /// `.` : pop and print under BASE; a constant variable prints its value.
    pub(crate) fn dot(&mut self) -> Result<(), Signal> {
        let mut token = self.pop_token()?;
        if let Token::VARIABLE(id) = &token {
            if self.vars[*id].is_constant() {
                if let Some(value) = self.vars[*id].value() {
                    token = value.clone();
                }
            }
        }
        print!("{} ", self.repr(&token));
        flush!();
        Ok(())
    }

    /// `?` : print the referenced cell.
    pub(crate) fn pfetch(&mut self) -> Result<(), Signal> {
        let target = self.pop_var_ref()?;
        let value = self.ref_value(&target)?;
        print!("{} ", self.repr(&value));
        flush!();
        Ok(())
    }

    /// PSTACK: the whole parameter stack, bottom first, nothing popped.
    pub(crate) fn pstack(&self) {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                print!(" ");
            }
            print!("{}", self.repr(token));
        }
        flush!();
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Session;

    #[test]
    fn numbers_render_under_base() {
        let mut dh = DataHolder::new();
        let token = Token::from(255);
        assert_eq!(dh.repr(&token), "255");
        dh.define_variable_int("BASE", 16);
        assert_eq!(dh.repr(&token), "FF");
        assert_eq!(dh.repr10(&token), "255");
        assert_eq!(dh.repr(&Token::NUMBER(crate::interpreter::number::Number::REAL(2.5))), "2.5");
    }

    #[test]
    fn variables_render_with_a_dollar() {
        let mut dh = DataHolder::new();
        let id = dh.define_variable_int("X", 0);
        assert_eq!(dh.repr(&Token::VARIABLE(id)), "$X");
        assert_eq!(dh.repr(&Token::VAR_REF { var: id, ind: 2 }), "$X[2]");
    }

    #[test]
    fn constants_render_as_their_value() {
        let mut dh = DataHolder::new();
        let id = dh.define_variable_with("TEN", Token::from(10));
        dh.vars[id].set_constant(true);
        assert_eq!(dh.repr(&Token::VARIABLE(id)), "10");
    }

    #[test]
    fn procedures_render_their_body() {
        let mut dh = DataHolder::new();
        dh.parse_line(": SQUARE DUP * ;").unwrap();
        let id = dh.dictionary.find_procedure("SQUARE").unwrap();
        assert_eq!(dh.repr(&Token::PROCEDURE(id)), ": SQUARE DUP * ;");
    }

    #[test]
    fn recursive_procedures_render_without_expanding() {
        let mut dh = DataHolder::new();
        dh.parse_line(": LOOPY LOOPY ;").unwrap();
        let id = dh.dictionary.find_procedure("LOOPY").unwrap();
        assert_eq!(dh.repr(&Token::PROCEDURE(id)), ": LOOPY LOOPY ;");
    }

    #[test]
    fn compiled_blocks_render_round() {
        let mut dh = DataHolder::new();
        dh.reader.push_line("I LOOP");
        let token = {
            use crate::interpreter::parser::Parsing;
            dh.parse_word("DO").unwrap()
        };
        dh.reader.pop_source();
        assert_eq!(dh.repr(&token), "DO I LOOP");
    }
}
