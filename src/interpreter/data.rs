// ©2024 Otmar Klenk
use super::Signal;
use super::dictionary::Dictionary;
use super::line_reader::LineReader;
use super::number::Number;
use super::token::{ProcId, Procedure, Token};
use super::variable::{VarId, Variable};
use super::vocabulary::BuiltinType;

pub(crate) const STACK_EMPTY: &str          = "STACK EMPTY";
pub(crate) const STACK_UNDERFLOW: &str      = "STACK UNDERFLOW";
pub(crate) const STACK_TOO_SMALL: &str      = "Stack too small";
pub(crate) const INVALID_INDEX: &str        = "Invalid index";
pub(crate) const MUST_BE_INT_OR_BOOL: &str  = "must be integer or boolean";
pub(crate) const MUST_BE_NUMBER: &str       = "must be number";
pub(crate) const MUST_BE_VARIABLE: &str     = "must be variable";
pub(crate) const MUST_BE_REF_VARIABLE: &str = "must be ref variable";
pub(crate) const MUST_BE_INTEGER: &str      = "Must be integer";
pub(crate) const NOT_A_VARIABLE: &str       = "Not a variable";
pub(crate) const INVALID_VARIABLE: &str     = "invalid variable";
pub(crate) const VAR_MUST_BE_NUMBER: &str   = "var must be number";
pub(crate) const NO_CURRENT_VARIABLE: &str  = "No current variable";
pub(crate) const LEAVE_NOT_INSIDE_DO: &str  = "Leave not inside do";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Interpret,
    Compile,
}

/// In-flight block built-in, tracked so LEAVE can find its loop.
#[derive(Clone, Debug)]
pub struct BlockCtx {
    pub(crate) kind:    BuiltinType,
    pub(crate) leave:   bool,
}

/////////////////////////////////////////////////////////////////////////////////////////

/// The whole interpreter state: arenas, dictionary, stacks, input sources,
/// parse mode markers and session flags. Built-ins take it by `&mut`.
pub struct DataHolder {
    pub(crate) vars:        Vec<Variable>,      // arena; FORGET unbinds, never frees
    pub(crate) procs:       Vec<Procedure>,     // arena
    pub(crate) dictionary:  Dictionary,
    pub(crate) tokens:      Vec<Token>,         // parameter stack
    pub(crate) ret_tokens:  Vec<Token>,         // return stack
    pub(crate) exec_blocks: Vec<BlockCtx>,      // block-execution stack
    pub(crate) reader:      LineReader,
    pub(crate) current_var: Option<VarId>,
    pub(crate) defining:    Option<(String, ProcId)>,
    word_var:               Option<VarId>,
    mode:                   Mode,
    mode_stack:             Vec<Mode>,
    debug:                  bool,
}

impl DataHolder {
    pub fn new() -> Self {
        Self {
            vars:           vec![],
            procs:          vec![],
            dictionary:     Dictionary::new(),
            tokens:         Vec::with_capacity(64),
            ret_tokens:     Vec::with_capacity(16),
            exec_blocks:    vec![],
            reader:         LineReader::new(),
            current_var:    None,
            defining:       None,
            word_var:       None,
            mode:           Mode::Interpret,
            mode_stack:     vec![],
            debug:          false,
        }
    }

    #[inline(always)]
    pub(crate) fn is_debug(&self) -> bool {
        self.debug
    }
    #[inline(always)]
    pub(crate) fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    #[allow(dead_code)]
    #[inline(always)]
    pub(crate) fn in_interpret_mode(&self) -> bool {
        self.mode == Mode::Interpret
    }
    pub(crate) fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(self.mode);
        self.mode = mode;
    }
    pub(crate) fn pop_mode(&mut self) {
        if let Some(mode) = self.mode_stack.pop() {
            self.mode = mode;
        }
    }

    pub(crate) fn trace(&self, label: &str, token: &Token) {
        if self.debug {
            println!("{label}: {}", self.repr10(token));
        }
    }

/////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn define_variable(&mut self, name: &str) -> VarId {
        let id = self.vars.len();
        self.vars.push(Variable::new(name));
        self.dictionary.ins_variable(name, id);
        if self.debug {
            println!("Define Var: {name}");
        }
        id
    }

    pub(crate) fn define_variable_with(&mut self, name: &str, token: Token) -> VarId {
        let id = self.define_variable(name);
        self.vars[id].add_value(token);
        id
    }

    pub(crate) fn define_variable_int(&mut self, name: &str, i: i64) -> VarId {
        self.define_variable_with(name, Token::from(i))
    }

    /// Process-wide WORD scratch; lazily created, never in the dictionary.
    pub(crate) fn word_var(&mut self) -> VarId {
        if let Some(id) = self.word_var {
            return id;
        }
        let id = self.vars.len();
        self.vars.push(Variable::new("WORD"));
        self.word_var = Some(id);
        id
    }

    pub(crate) fn get_base(&self) -> i64 {
        let Some(id) = self.dictionary.find_variable("BASE") else { return 10; };
        let Some(base) = self.vars[id].get_integer() else { return 10; };
        if base < 2 || base > 36 { 10 } else { base }
    }

/////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn push_token(&mut self, token: Token) {
        self.trace("Push", &token);
        self.tokens.push(token);
    }

    // copies silently; references stay aliased to their variable
    #[inline]
    pub(crate) fn push_dup_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub(crate) fn push_boolean(&mut self, b: bool) {
        self.push_token(Token::BOOL(b));
    }
    #[inline]
    pub(crate) fn push_integer(&mut self, i: i64) {
        self.push_token(Token::from(i));
    }
    #[inline]
    pub(crate) fn push_number(&mut self, n: Number) {
        self.push_token(Token::NUMBER(n));
    }

    pub(crate) fn pop_token(&mut self) -> Result<Token, Signal> {
        let Some(token) = self.tokens.pop() else { return Err(Signal::error(STACK_EMPTY)); };
        self.trace("Pop", &token);
        Ok(token)
    }

    pub(crate) fn peek_token_n(&self, n: i64) -> Result<Token, Signal> {
        let nt = self.tokens.len();
        if n <= 0 {
            return Err(Signal::error(INVALID_INDEX));
        }
        if n as usize > nt {
            return Err(Signal::error(STACK_TOO_SMALL));
        }
        Ok(self.tokens[nt - n as usize].clone())
    }

    pub(crate) fn pop_boolean(&mut self) -> Result<bool, Signal> {
        let token = self.pop_token()?;
        match token {
            Token::NUMBER(n)    => Ok(n.integer() != 0),
            Token::BOOL(b)      => Ok(b),
            _                   => Err(Signal::error(MUST_BE_INT_OR_BOOL)),
        }
    }

    /// Constant variables stand for their value wherever a number is wanted.
    pub(crate) fn token_to_number(&self, token: &Token) -> Result<Number, Signal> {
        let mut t = token;
        let unwrapped;
        if let Token::VARIABLE(id) = token {
            if self.vars[*id].is_constant() {
                unwrapped = self.vars[*id].value().cloned();
                if let Some(u) = &unwrapped {
                    t = u;
                }
            }
        }
        match t {
            Token::NUMBER(n)    => Ok(n.clone()),
            _                   => Err(Signal::error(MUST_BE_NUMBER)),
        }
    }

    fn token_to_bool_or_number(&self, token: &Token) -> Result<Number, Signal> {
        if let Token::BOOL(b) = token {
            return Ok(Number::BOOLEAN(*b));
        }
        self.token_to_number(token).map_err(|_| Signal::error(MUST_BE_INT_OR_BOOL))
    }

    pub(crate) fn pop_number(&mut self) -> Result<Number, Signal> {
        let token = self.pop_token()?;
        self.token_to_number(&token)
    }

    pub(crate) fn pop_numbers(&mut self) -> Result<(Number, Number), Signal> {
        let n2 = self.pop_number()?;
        let n1 = self.pop_number()?;
        Ok((n1, n2))
    }

    pub(crate) fn pop_numbers3(&mut self) -> Result<(Number, Number, Number), Signal> {
        let n3 = self.pop_number()?;
        let n2 = self.pop_number()?;
        let n1 = self.pop_number()?;
        Ok((n1, n2, n3))
    }

    pub(crate) fn pop_bool_or_number(&mut self) -> Result<Number, Signal> {
        let token = self.pop_token()?;
        self.token_to_bool_or_number(&token)
    }

    pub(crate) fn pop_bool_or_numbers(&mut self) -> Result<(Number, Number), Signal> {
        let n2 = self.pop_bool_or_number()?;
        let n1 = self.pop_bool_or_number()?;
        Ok((n1, n2))
    }

    pub(crate) fn pop_var_ref(&mut self) -> Result<Token, Signal> {
        let token = self.pop_token()?;
        if ! token.is_var_ref(&self.vars) {
            return Err(Signal::error(MUST_BE_REF_VARIABLE));
        }
        Ok(token)
    }

    pub(crate) fn pop_variable(&mut self) -> Result<VarId, Signal> {
        let token = self.pop_token()?;
        match token {
            Token::VARIABLE(id) => Ok(id),
            _                   => Err(Signal::error(MUST_BE_VARIABLE)),
        }
    }

    #[inline(always)]
    pub(crate) fn clear_tokens(&mut self) {
        self.tokens.clear();
    }
    #[inline(always)]
    pub(crate) fn clear_ret_tokens(&mut self) {
        self.ret_tokens.clear();
    }
    #[inline(always)]
    pub(crate) fn clear_exec_blocks(&mut self) {
        self.exec_blocks.clear();
    }

/////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn dup(&mut self) -> Result<(), Signal> {
        let Some(token) = self.tokens.last().cloned() else { return Err(Signal::error(STACK_EMPTY)); };
        self.trace("Dup", &token);
        self.push_dup_token(token);
        Ok(())
    }

    pub(crate) fn drop_top(&mut self) -> Result<(), Signal> {
        let Some(token) = self.tokens.pop() else { return Err(Signal::error(STACK_EMPTY)); };
        self.trace("Drop", &token);
        Ok(())
    }

    pub(crate) fn swap(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 2 {
            return Err(Signal::error(STACK_EMPTY));
        }
        self.tokens.swap(nt - 1, nt - 2);
        Ok(())
    }

    pub(crate) fn over(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 2 {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        let token = self.tokens[nt - 2].clone();
        self.trace("Over", &token);
        self.push_dup_token(token);
        Ok(())
    }

    pub(crate) fn rot(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 3 {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        let token = self.tokens.remove(nt - 3);  // 1 2 3 -> 2 3 1
        self.trace("Rot", &token);
        self.tokens.push(token);
        Ok(())
    }

    pub(crate) fn pick(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        if ! n.is_integer() {
            return Err(Signal::error(MUST_BE_INTEGER));
        }
        let token = self.peek_token_n(n.integer())?;
        self.push_dup_token(token);
        Ok(())
    }

    pub(crate) fn roll(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        if ! n.is_integer() {
            return Err(Signal::error(MUST_BE_INTEGER));
        }
        let i = n.integer();
        let nt = self.tokens.len();
        if i <= 0 {
            return Err(Signal::error(INVALID_INDEX));
        }
        if i as usize > nt {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        let token = self.tokens.remove(nt - i as usize);
        self.trace("Roll", &token);
        self.tokens.push(token);
        Ok(())
    }

    // dup unless the top is zero; the zero stays put
    pub(crate) fn qdup(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        let nonzero = n.integer() != 0;
        self.push_number(n.clone());
        if nonzero {
            self.push_number(n);
        }
        Ok(())
    }

    pub(crate) fn depth(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len() as i64;
        self.push_integer(nt);
        Ok(())
    }

    pub(crate) fn to_ret(&mut self) -> Result<(), Signal> {
        let token = self.pop_token()?;
        self.ret_tokens.push(token);
        Ok(())
    }

    pub(crate) fn from_ret(&mut self) -> Result<(), Signal> {
        let Some(token) = self.ret_tokens.pop() else { return Err(Signal::error(STACK_EMPTY)); };
        self.push_token(token);
        Ok(())
    }

    pub(crate) fn copy_ret(&mut self) -> Result<(), Signal> {
        let Some(token) = self.ret_tokens.last().cloned() else { return Err(Signal::error(STACK_EMPTY)); };
        self.push_token(token);
        Ok(())
    }

/////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn ref_value(&self, token: &Token) -> Result<Token, Signal> {
        let Some((var, ind)) = token.ref_parts(&self.vars) else {
            return Err(Signal::error(NOT_A_VARIABLE));
        };
        match self.vars[var].ind_value(ind) {
            Some(t) => Ok(t.clone()),
            None    => Err(Signal::error(INVALID_VARIABLE)),
        }
    }

    pub(crate) fn ref_ind_value(&self, token: &Token, i: i64) -> Option<Token> {
        let (var, ind) = token.ref_parts(&self.vars)?;
        self.vars[var].ind_value(ind + i).cloned()
    }

    pub(crate) fn set_ref_ind_value(&mut self, token: &Token, i: i64, value: Token) -> bool {
        let Some((var, ind)) = token.ref_parts(&self.vars) else { return false; };
        self.vars[var].set_ind_value(ind + i, value)
    }

    pub(crate) fn fetch(&mut self) -> Result<(), Signal> {
        let Some(token) = self.tokens.pop() else { return Err(Signal::error(STACK_UNDERFLOW)); };
        if ! token.is_var_ref(&self.vars) {
            return Err(Signal::error(NOT_A_VARIABLE));
        }
        let value = self.ref_value(&token)?;
        self.trace("Fetch", &value);
        self.tokens.push(value);
        Ok(())
    }

    pub(crate) fn store(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 2 {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        let target = self.tokens.pop().unwrap();
        let value = self.tokens.pop().unwrap();
        if ! target.is_var_ref(&self.vars) {
            return Err(Signal::error(NOT_A_VARIABLE));
        }
        self.trace("Store", &value);
        if ! self.set_ref_ind_value(&target, 0, value) {
            return Err(Signal::error(INVALID_VARIABLE));
        }
        Ok(())
    }

    pub(crate) fn add_store(&mut self) -> Result<(), Signal> {
        let id = self.pop_variable()?;
        let n = self.pop_number()?;
        let Some(token) = self.vars[id].value().cloned() else {
            return Err(Signal::error(INVALID_VARIABLE));
        };
        let Token::NUMBER(vn) = token else { return Err(Signal::error(VAR_MUST_BE_NUMBER)); };
        self.vars[id].set_value(Token::NUMBER(vn + n));
        Ok(())
    }

    pub(crate) fn move_cells(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        let dst = self.pop_var_ref()?;
        let src = self.pop_var_ref()?;
        for i in 0..n.integer() {
            let Some(value) = self.ref_ind_value(&src, i) else { break; };
            self.set_ref_ind_value(&dst, i, value);
        }
        Ok(())
    }

    pub(crate) fn fill_cells(&mut self) -> Result<(), Signal> {
        let value = self.pop_token()?;
        let n = self.pop_number()?;
        let target = self.pop_var_ref()?;
        for i in 0..n.integer() {
            self.set_ref_ind_value(&target, i, value.clone());
        }
        Ok(())
    }

/////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn cmp_op(&mut self) -> Result<i32, Signal> {
        let t2 = self.pop_token()?;
        let t1 = self.pop_token()?;
        if t1.is_var_ref(&self.vars) && t2.is_var_ref(&self.vars) {
            return t1.cmp(&t2, &self.vars).map_err(Signal::error);
        }
        let n2 = self.token_to_bool_or_number(&t2)?;
        let n1 = self.token_to_bool_or_number(&t1)?;
        Ok(Number::cmp(&n1, &n2))
    }

    pub(crate) fn ucmp_op(&mut self) -> Result<i32, Signal> {
        let (n1, n2) = self.pop_numbers()?;
        let u1 = n1.integer() as u32;
        let u2 = n2.integer() as u32;
        Ok(if u1 > u2 { 1 } else if u1 < u2 { -1 } else { 0 })
    }

    pub(crate) fn plus(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 2 {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        if self.tokens[nt - 2].is_var_ref(&self.vars) {
            let n = self.pop_number()?;
            let target = self.pop_var_ref()?;
            self.push_indexed(&target, n.integer())
        }
        else if self.tokens[nt - 1].is_var_ref(&self.vars) {
            let target = self.pop_var_ref()?;
            let n = self.pop_number()?;
            self.push_indexed(&target, n.integer())
        }
        else {
            let (n1, n2) = self.pop_numbers()?;
            self.push_number(n1 + n2);
            Ok(())
        }
    }

    pub(crate) fn minus(&mut self) -> Result<(), Signal> {
        let nt = self.tokens.len();
        if nt < 2 {
            return Err(Signal::error(STACK_UNDERFLOW));
        }
        if self.tokens[nt - 2].is_var_ref(&self.vars) {
            let n = self.pop_number()?;
            let target = self.pop_var_ref()?;
            self.push_indexed(&target, -n.integer())
        }
        else if self.tokens[nt - 1].is_var_ref(&self.vars) {
            let target = self.pop_var_ref()?;
            let n = self.pop_number()?;
            self.push_indexed(&target, -n.integer())
        }
        else {
            let (n1, n2) = self.pop_numbers()?;
            self.push_number(n1 - n2);
            Ok(())
        }
    }

    fn push_indexed(&mut self, target: &Token, n: i64) -> Result<(), Signal> {
        match target.index_var(n, &self.vars) {
            Some(r) => {
                self.push_token(r);
                Ok(())
            }
            None    => unreachable!(),
        }
    }

    pub(crate) fn plus_n(&mut self, n: i64) -> Result<(), Signal> {
        let Some(token) = self.tokens.pop() else { return Err(Signal::error(STACK_UNDERFLOW)); };
        if token.is_var_ref(&self.vars) {
            self.push_indexed(&token, n)
        }
        else {
            let num = self.token_to_number(&token)?;
            self.push_number(num + Number::INTEGER(n));
            Ok(())
        }
    }

    pub(crate) fn times(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        self.push_number(n1 * n2);
        Ok(())
    }

    pub(crate) fn divide(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        let n = n1.divide(n2).map_err(Signal::error)?;
        self.push_number(n);
        Ok(())
    }

    pub(crate) fn modulo(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        let n = n1.modulo(n2).map_err(Signal::error)?;
        self.push_number(n);
        Ok(())
    }

    pub(crate) fn dmod(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        let rem = n1.clone().modulo(n2.clone()).map_err(Signal::error)?;
        let quot = n1.divide(n2).map_err(Signal::error)?;
        self.push_number(rem);
        self.push_number(quot);
        Ok(())
    }

    pub(crate) fn muldiv(&mut self) -> Result<(), Signal> {
        let (n1, n2, n3) = self.pop_numbers3()?;
        let n = (n1 * n2).divide(n3).map_err(Signal::error)?;
        self.push_number(n);
        Ok(())
    }

    pub(crate) fn max_op(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        self.push_number(n1.max_of(n2));
        Ok(())
    }

    pub(crate) fn min_op(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_numbers()?;
        self.push_number(n1.min_of(n2));
        Ok(())
    }

    pub(crate) fn abs_op(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        self.push_number(n.abs());
        Ok(())
    }

    pub(crate) fn negate(&mut self) -> Result<(), Signal> {
        let n = self.pop_number()?;
        self.push_number(-n);
        Ok(())
    }

    pub(crate) fn and_op(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_bool_or_numbers()?;
        self.push_number(n1.and(n2));
        Ok(())
    }

    pub(crate) fn or_op(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_bool_or_numbers()?;
        self.push_number(n1.or(n2));
        Ok(())
    }

    pub(crate) fn xor_op(&mut self) -> Result<(), Signal> {
        let (n1, n2) = self.pop_bool_or_numbers()?;
        self.push_number(n1.xor(n2));
        Ok(())
    }

    pub(crate) fn not_op(&mut self) -> Result<(), Signal> {
        let n = self.pop_bool_or_number()?;
        self.push_number(n.not());
        Ok(())
    }

/////////////////////////////////////////////////////////////////////////////////////////

    /// Arm the leave flag of the innermost DO or BEGIN on the block stack.
    pub(crate) fn leave(&mut self) -> Result<(), Signal> {
        for ctx in self.exec_blocks.iter_mut().rev() {
            match ctx.kind {
                BuiltinType::DO | BuiltinType::BEGIN    => {
                    ctx.leave = true;
                    return Ok(());
                }
                _                                       => {}
            }
        }
        Err(Signal::error(LEAVE_NOT_INSIDE_DO))
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn dh_with(stack: &[i64]) -> DataHolder {
        let mut dh = DataHolder::new();
        for &i in stack {
            dh.push_integer(i);
        }
        dh
    }

    fn ints(dh: &DataHolder) -> Vec<i64> {
        dh.tokens.iter().map(|t| match t {
            Token::NUMBER(n)    => n.integer(),
            Token::BOOL(b)      => *b as i64,
            _                   => panic!("unexpected token"),
        }).collect()
    }

    #[test]
    fn stack_words_net_effects() {
        let mut dh = dh_with(&[1, 2, 3]);
        dh.dup().unwrap();
        assert_eq!(ints(&dh), [1, 2, 3, 3]);
        dh.drop_top().unwrap();
        dh.swap().unwrap();
        assert_eq!(ints(&dh), [1, 3, 2]);
        dh.over().unwrap();
        assert_eq!(ints(&dh), [1, 3, 2, 3]);
        dh.rot().unwrap();
        assert_eq!(ints(&dh), [1, 2, 3, 3]);
    }

    #[test]
    fn pick_and_roll_are_one_based() {
        let mut dh = dh_with(&[10, 20, 30]);
        dh.push_integer(3);
        dh.pick().unwrap();
        assert_eq!(ints(&dh), [10, 20, 30, 10]);
        dh.push_integer(4);
        dh.roll().unwrap();
        assert_eq!(ints(&dh), [20, 30, 10, 10]);
        dh.push_integer(0);
        assert!(dh.roll().is_err());
    }

    #[test]
    fn qdup_leaves_zero_alone() {
        let mut dh = dh_with(&[0]);
        dh.qdup().unwrap();
        assert_eq!(ints(&dh), [0]);
        let mut dh = dh_with(&[7]);
        dh.qdup().unwrap();
        assert_eq!(ints(&dh), [7, 7]);
    }

    #[test]
    fn return_stack_words() {
        let mut dh = dh_with(&[1, 2]);
        dh.to_ret().unwrap();
        assert_eq!(ints(&dh), [1]);
        dh.copy_ret().unwrap();
        assert_eq!(ints(&dh), [1, 2]);
        dh.from_ret().unwrap();
        assert_eq!(ints(&dh), [1, 2, 2]);
        assert!(dh.from_ret().is_err());
    }

    #[test]
    fn underflow_is_reported() {
        let mut dh = DataHolder::new();
        assert!(dh.dup().is_err());
        assert!(dh.plus().is_err());
        let mut dh = dh_with(&[1]);
        assert!(dh.swap().is_err());
    }

    #[test]
    fn plus_builds_references() {
        let mut dh = DataHolder::new();
        let id = dh.define_variable("A");
        dh.vars[id].allot(4);
        dh.push_token(Token::VARIABLE(id));
        dh.push_integer(2);
        dh.plus().unwrap();
        assert_eq!(dh.tokens.last(), Some(&Token::VAR_REF { var: id, ind: 2 }));
        dh.push_integer(1);
        dh.minus().unwrap();
        assert_eq!(dh.tokens.last(), Some(&Token::VAR_REF { var: id, ind: 1 }));
        dh.plus_n(1).unwrap();
        assert_eq!(dh.tokens.last(), Some(&Token::VAR_REF { var: id, ind: 2 }));
    }

    #[test]
    fn store_and_fetch_through_refs() {
        let mut dh = DataHolder::new();
        let id = dh.define_variable_int("X", 0);
        dh.push_integer(5);
        dh.push_token(Token::VARIABLE(id));
        dh.store().unwrap();
        dh.push_token(Token::VARIABLE(id));
        dh.fetch().unwrap();
        assert_eq!(ints(&dh), [5]);
    }

    #[test]
    fn store_rejects_non_reference() {
        let mut dh = dh_with(&[1, 2]);
        assert!(matches!(dh.store(), Err(Signal::Error(msg)) if msg == NOT_A_VARIABLE));
    }

    #[test]
    fn add_store_requires_plain_variable() {
        let mut dh = DataHolder::new();
        let id = dh.define_variable_int("X", 40);
        dh.push_integer(2);
        dh.push_token(Token::VARIABLE(id));
        dh.add_store().unwrap();
        assert_eq!(dh.vars[id].get_integer(), Some(42));

        dh.push_integer(1);
        dh.push_token(Token::VAR_REF { var: id, ind: 0 });
        assert!(matches!(dh.add_store(), Err(Signal::Error(msg)) if msg == MUST_BE_VARIABLE));
    }

    #[test]
    fn move_and_fill_copy_cells() {
        let mut dh = DataHolder::new();
        let src = dh.define_variable("S");
        dh.vars[src].allot(3);
        for i in 0..3 {
            dh.vars[src].set_ind_value(i, Token::from(i + 1));
        }
        let dst = dh.define_variable("D");
        dh.vars[dst].allot(3);

        dh.push_token(Token::VARIABLE(src));
        dh.push_token(Token::VARIABLE(dst));
        dh.push_integer(3);
        dh.move_cells().unwrap();
        assert_eq!(dh.vars[dst].ind_value(2), Some(&Token::from(3)));

        dh.push_token(Token::VARIABLE(dst));
        dh.push_integer(2);
        dh.push_integer(9);
        dh.fill_cells().unwrap();
        assert_eq!(dh.vars[dst].ind_value(0), Some(&Token::from(9)));
        assert_eq!(dh.vars[dst].ind_value(1), Some(&Token::from(9)));
        assert_eq!(dh.vars[dst].ind_value(2), Some(&Token::from(3)));
    }

    #[test]
    fn base_is_ten_when_unset_or_out_of_range() {
        let mut dh = DataHolder::new();
        assert_eq!(dh.get_base(), 10);
        let id = dh.define_variable_int("BASE", 16);
        assert_eq!(dh.get_base(), 16);
        dh.vars[id].set_integer(99);
        assert_eq!(dh.get_base(), 10);
        dh.vars[id].set_integer(1);
        assert_eq!(dh.get_base(), 10);
    }

    #[test]
    fn ucmp_is_unsigned_32bit() {
        let mut dh = dh_with(&[-1, 1]);
        assert_eq!(dh.ucmp_op().unwrap(), 1);  // 0xFFFFFFFF > 1
        let mut dh = dh_with(&[1, 2]);
        assert_eq!(dh.ucmp_op().unwrap(), -1);
    }

    #[test]
    fn leave_requires_a_loop_block() {
        let mut dh = DataHolder::new();
        assert!(dh.leave().is_err());
        dh.exec_blocks.push(BlockCtx { kind: BuiltinType::DO, leave: false });
        dh.exec_blocks.push(BlockCtx { kind: BuiltinType::IF, leave: false });
        dh.leave().unwrap();
        assert!(dh.exec_blocks[0].leave);
        assert!(! dh.exec_blocks[1].leave);
    }
}
