// ©2024 Otmar Klenk
use std::collections::HashMap;

use super::token::ProcId;
use super::variable::VarId;

/// User-name maps. Each name owns a stack of definitions: redefinition
/// pushes, FORGET pops, lookup sees the most recent. Names are
/// case-sensitive; only the built-in registry folds case.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    variables:      HashMap<String, Vec<VarId>>,
    procedures:     HashMap<String, Vec<ProcId>>,
}

impl Dictionary {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ins_variable(&mut self, name: &str, id: VarId) {
        self.variables.entry(name.to_string()).or_default().push(id);
    }

    pub(crate) fn ins_procedure(&mut self, name: &str, id: ProcId) {
        self.procedures.entry(name.to_string()).or_default().push(id);
    }

    pub(crate) fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables.get(name)?.last().copied()
    }

    pub(crate) fn find_procedure(&self, name: &str) -> Option<ProcId> {
        self.procedures.get(name)?.last().copied()
    }

    pub(crate) fn forget_variable(&mut self, name: &str) -> bool {
        let Some(defs) = self.variables.get_mut(name) else { return false; };
        defs.pop().is_some()
    }

    pub(crate) fn forget_procedure(&mut self, name: &str) -> bool {
        let Some(defs) = self.procedures.get_mut(name) else { return false; };
        defs.pop().is_some()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_is_last_in_first_out() {
        let mut dict = Dictionary::new();
        dict.ins_variable("X", 0);
        dict.ins_variable("X", 1);
        dict.ins_variable("X", 2);
        assert_eq!(dict.find_variable("X"), Some(2));
        assert!(dict.forget_variable("X"));
        assert_eq!(dict.find_variable("X"), Some(1));
        assert!(dict.forget_variable("X"));
        assert!(dict.forget_variable("X"));
        assert_eq!(dict.find_variable("X"), None);
        assert!(! dict.forget_variable("X"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut dict = Dictionary::new();
        dict.ins_procedure("square", 0);
        assert_eq!(dict.find_procedure("square"), Some(0));
        assert_eq!(dict.find_procedure("SQUARE"), None);
    }

    #[test]
    fn variables_and_procedures_do_not_collide() {
        let mut dict = Dictionary::new();
        dict.ins_variable("X", 3);
        dict.ins_procedure("X", 7);
        assert_eq!(dict.find_variable("X"), Some(3));
        assert_eq!(dict.find_procedure("X"), Some(7));
        assert!(dict.forget_variable("X"));
        assert_eq!(dict.find_procedure("X"), Some(7));
    }
}
