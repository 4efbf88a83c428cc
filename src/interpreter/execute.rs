// ©2024 Otmar Klenk
use super::Signal;
use super::data::{BlockCtx, DataHolder};
use super::number::Number;
use super::token::Token;
use super::vocabulary::{BeginTokens, DoTokens, IfTokens};

pub trait Execute {
    fn exec_token(&mut self, token: &Token) -> Result<(), Signal>;
    fn looping(&mut self, d: &DoTokens) -> Result<(), Signal>;
    fn forking(&mut self, t: &IfTokens) -> Result<(), Signal>;
    fn repeating(&mut self, t: &BeginTokens) -> Result<(), Signal>;
}

impl Execute for DataHolder {
    /// Non-executable tokens are pushed (a named variable also becomes the
    /// current variable and runs its DOES> body); block built-ins run framed
    /// on the block-execution stack so LEAVE can find them.
    fn exec_token(&mut self, token: &Token) -> Result<(), Signal> {
        if token.is_executable() {
            if self.is_debug() {
                println!("Exec: {}", self.repr10(token));
            }
            if token.is_block() {
                let Token::BUILTIN(b) = token else { unreachable!() };
                self.exec_blocks.push(BlockCtx { kind: b.kind(), leave: false });
                let rslt = b.exec(self);
                self.exec_blocks.pop();
                rslt
            }
            else {
                match token {
                    Token::BUILTIN(b)       => b.exec(self),
                    Token::PROCEDURE(id)    => {
                        let tokens = self.procs[*id].tokens.clone();
                        for t in &tokens {
                            self.exec_token(t)?;
                        }
                        Ok(())
                    }
                    _                       => unreachable!(),
                }
            }
        }
        else {
            self.push_token(token.clone());
            if let Token::VARIABLE(id) = token {
                self.current_var = Some(*id);
                let body = self.vars[*id].exec_tokens.clone();
                for t in &body {
                    self.exec_token(t)?;
                }
            }
            Ok(())
        }
    }

    /// DO: pop the limit, then the start; park both on the return stack so I
    /// and J read them; step until the start passes the limit.
    fn looping(&mut self, d: &DoTokens) -> Result<(), Signal> {
        let limit = self.pop_token()?;
        let mut start = self.pop_token()?;

        self.ret_tokens.push(start.clone());
        self.ret_tokens.push(limit.clone());
        let slot = self.ret_tokens.len() - 2;
        let my = self.exec_blocks.len().saturating_sub(1);

        let rslt = (|| -> Result<(), Signal> {
            let up = limit.cmp(&start, &self.vars).map_err(Signal::error)? > 0;
            loop {
                let cmp = limit.cmp(&start, &self.vars).map_err(Signal::error)?;
                if up { if cmp <= 0 { break; } } else if cmp >= 0 { break; }

                for t in &d.tokens {
                    self.exec_token(t)?;
                    if self.leave_armed(my) {
                        break;
                    }
                }
                if self.leave_armed(my) {
                    break;
                }

                let inc = if d.inc_token { self.pop_number()? } else { Number::INTEGER(1) };
                start.inc(&inc, &mut self.vars).map_err(Signal::error)?;
                if let Some(cell) = self.ret_tokens.get_mut(slot) {
                    *cell = start.clone();
                }
            }
            Ok(())
        })();

        self.ret_tokens.truncate(slot);
        rslt
    }

    fn forking(&mut self, t: &IfTokens) -> Result<(), Signal> {
        let b = self.pop_boolean()?;
        let tokens = if b { &t.if_tokens } else { &t.else_tokens };
        for token in tokens {
            self.exec_token(token)?;
        }
        Ok(())
    }

    fn repeating(&mut self, t: &BeginTokens) -> Result<(), Signal> {
        let my = self.exec_blocks.len().saturating_sub(1);
        if t.is_until {
            loop {
                for token in &t.tokens {
                    self.exec_token(token)?;
                    if self.leave_armed(my) {
                        break;
                    }
                }
                if self.leave_armed(my) {
                    break;
                }
                if self.pop_boolean()? {
                    break;
                }
            }
        }
        else {
            loop {
                for token in &t.while_tokens {
                    self.exec_token(token)?;
                    if self.leave_armed(my) {
                        break;
                    }
                }
                if self.leave_armed(my) {
                    break;
                }
                if self.pop_boolean()? {
                    break;
                }
                for token in &t.tokens {
                    self.exec_token(token)?;
                    if self.leave_armed(my) {
                        break;
                    }
                }
                if self.leave_armed(my) {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl DataHolder {
    #[inline(always)]
    fn leave_armed(&self, idx: usize) -> bool {
        self.exec_blocks.get(idx).map_or(false, |ctx| ctx.leave)
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
