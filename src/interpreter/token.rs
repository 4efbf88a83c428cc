// ©2024 Otmar Klenk
#![allow(non_camel_case_types)]

use super::number::Number;
use super::variable::{VarId, Variable};
use super::vocabulary::{Builtin, BuiltinType};

pub type ProcId = usize;

pub(crate) const CMP_NOT_SUPPORTED: &str = "cmp not supported";
pub(crate) const INC_NOT_SUPPORTED: &str = "inc not supported";

/// Compiled user procedure; bodies are fully resolved token lists.
#[derive(Clone, Debug, PartialEq)]
pub struct Procedure {
    name:               String,
    pub(crate) tokens:  Vec<Token>,
}

impl Procedure {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name:   name.to_string(),
            tokens: vec![],
        }
    }

    #[inline(always)]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

/// One resolved word. Variables and references are arena indices; built-ins
/// carry their compiled modifier inline, one fresh instance per compile site.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    BOOL(bool),
    NUMBER(Number),
    BUILTIN(Builtin),
    VARIABLE(VarId),
    VAR_REF { var: VarId, ind: i64 },
    PROCEDURE(ProcId),
}

impl Token {
    #[inline(always)]
    pub(crate) fn is_executable(&self) -> bool {
        matches!(self, Token::BUILTIN(_) | Token::PROCEDURE(_))
    }

    #[inline]
    pub(crate) fn is_block(&self) -> bool {
        match self {
            Token::BUILTIN(b)   => matches!(b.kind(), BuiltinType::DO | BuiltinType::IF | BuiltinType::BEGIN),
            _                   => false,
        }
    }

    #[inline]
    pub(crate) fn is_null(&self) -> bool {
        match self {
            Token::BUILTIN(b)   => b.kind() == BuiltinType::COMMENT,
            _                   => false,
        }
    }

    // constants are not references; derived refs always are
    pub(crate) fn is_var_ref(&self, vars: &[Variable]) -> bool {
        match self {
            Token::VARIABLE(id)     => ! vars[*id].is_constant(),
            Token::VAR_REF { .. }   => true,
            _                       => false,
        }
    }

    /// (variable, offset) pair addressed by this token.
    pub(crate) fn ref_parts(&self, vars: &[Variable]) -> Option<(VarId, i64)> {
        match self {
            Token::VARIABLE(id)         => Some((*id, vars[*id].ind())),
            Token::VAR_REF { var, ind } => Some((*var, *ind)),
            _                           => None,
        }
    }

    /// `ref ± n` and `1+`/`2+` on references: shift the offset, keep the target.
    pub(crate) fn index_var(&self, n: i64, vars: &[Variable]) -> Option<Token> {
        let (var, ind) = self.ref_parts(vars)?;
        Some(Token::VAR_REF { var, ind: ind + n })
    }

    pub(crate) fn cmp(&self, other: &Token, vars: &[Variable]) -> Result<i32, String> {
        match (self, other) {
            (Token::NUMBER(n1), Token::NUMBER(n2))  => Ok(Number::cmp(n1, n2)),
            _                                       => {
                let (Some(p1), Some(p2)) = (self.ref_parts(vars), other.ref_parts(vars)) else {
                    return Err(CMP_NOT_SUPPORTED.to_string());
                };
                if p1 > p2 { Ok(1) } else if p1 < p2 { Ok(-1) } else { Ok(0) }
            }
        }
    }

    pub(crate) fn inc(&mut self, n: &Number, vars: &mut [Variable]) -> Result<(), String> {
        match self {
            Token::NUMBER(num)          => {
                num.inc(n);
                Ok(())
            }
            Token::VAR_REF { ind, .. }  => {
                *ind += n.integer();
                Ok(())
            }
            Token::VARIABLE(_)          => {
                let Some(shifted) = self.index_var(n.integer(), vars) else {
                    return Err(INC_NOT_SUPPORTED.to_string());
                };
                *self = shifted;
                Ok(())
            }
            _                           => Err(INC_NOT_SUPPORTED.to_string()),
        }
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Token {
        Token::BOOL(b)
    }
}
impl From<Number> for Token {
    fn from(n: Number) -> Token {
        Token::NUMBER(n)
    }
}
impl From<i64> for Token {
    fn from(i: i64) -> Token {
        Token::NUMBER(Number::INTEGER(i))
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
