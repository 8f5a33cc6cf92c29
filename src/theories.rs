//! Ready-made axioms for a few standard theories, postulated under the
//! default notation. These are ordinary [`Proposition`]s; proofs import
//! them with [`Proposition::recall`].

use crate::hygiene::fresh_name;
use crate::proposition::Proposition;
use crate::statement::Statement;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Peano-style arithmetic over configurable symbols for the successor
/// operation, the number predicate and the zero numeral.
pub struct Arithmetic {
    successor: String,
    predicate: String,
    zero: String,
}

impl Default for Arithmetic {
    fn default() -> Self {
        Arithmetic {
            successor: "1+".to_string(),
            predicate: "nat".to_string(),
            zero: "0".to_string(),
        }
    }
}

impl Arithmetic {
    pub fn new() -> Self {
        Arithmetic::default()
    }

    pub fn with_symbols(successor: &str, predicate: &str, zero: &str) -> Self {
        Arithmetic {
            successor: successor.to_string(),
            predicate: predicate.to_string(),
            zero: zero.to_string(),
        }
    }

    /// Zero is a number and is nobody's successor.
    pub fn zero(&self) -> Proposition {
        let mut axiom = Proposition::new("Arithmetic: Zero");
        let given = format!("[{}[]]", self.zero);
        let number = format!("[[{}[]]{}]", self.zero, self.predicate);
        let not_successor = format!(
            "[[n][[n]{p}][[{z}[]]=[{s}[n]]]:[![]]]",
            p = self.predicate,
            z = self.zero,
            s = self.successor
        );
        axiom.postulate(&format!("{}{}{}", given, number, not_successor));
        axiom
    }

    /// Successors are numbers, and the successor operation is injective.
    pub fn successor(&self) -> Proposition {
        let mut axiom = Proposition::new("Arithmetic: Successor");
        let statement = format!(
            "[[n][[n]{p}]:[{s}[n]][[{s}[n]]{p}][[m][[m]{p}][[{s}[n]]=[{s}[m]]]:[[n]=[m]]]]",
            p = self.predicate,
            s = self.successor
        );
        axiom.postulate(&statement);
        axiom
    }

    /// An induction-schema instance for `statement`, where `var` names the
    /// induction variable and `context` binds the statement's parameters.
    pub fn induction(&self, statement: &str, context: &str, var: &str) -> Proposition {
        let mut axiom = Proposition::new("Arithmetic: Induction");
        let pattern = format!("[{}]", var);
        let base = statement.replace(&pattern, &format!("[{}[]]", self.zero));
        let next = statement.replace(&pattern, &format!("[{}[{}]]", self.successor, var));
        let step = format!(
            "[[{v}][[{v}]{p}]{stat}:{next}]",
            v = var,
            p = self.predicate,
            stat = statement,
            next = next
        );
        let conclusion = format!(
            "[[{v}][[{v}]{p}]:{stat}]",
            v = var,
            p = self.predicate,
            stat = statement
        );
        axiom.postulate(&format!("[{}{}{}:{}]", context, base, step, conclusion));
        axiom
    }
}

/// Boolean reasoning principles, instantiated per statement.
pub struct Boolean;

impl Boolean {
    /// From falsum, the given statement follows.
    pub fn false_universality(statement: &str, context: &str) -> Proposition {
        let mut axiom = Proposition::new("Boolean: False universality");
        axiom.postulate(&format!("[{}[![]]:{}]", context, statement));
        axiom
    }

    /// A refuted refutation yields the statement itself.
    pub fn double_negation(statement: &str, context: &str) -> Proposition {
        let mut axiom = Proposition::new("Boolean: Double negation");
        axiom.postulate(&format!(
            "[{ctx}[[{stat}:[![]]]:[![]]]:{stat}]",
            ctx = context,
            stat = statement
        ));
        axiom
    }
}

/// Axioms relating subsets and set equality.
pub struct Sets;

impl Sets {
    /// Subset containment unfolded as an inference over elements.
    pub fn subset_inclusion() -> Proposition {
        let mut axiom = Proposition::new("Subset inclusion");
        axiom.postulate(
            "[[X][set[X]][Y][set[Y]]:[[[X]subset[Y]]=[[x][set[x]][[x]in[X]]:[[x]in[Y]]]]]",
        );
        axiom
    }

    /// Sets are equal exactly when each contains the other.
    pub fn set_equality() -> Proposition {
        let mut axiom = Proposition::new("Set equality");
        axiom.postulate(
            "[[X][set[X]][Y][set[Y]]:[[[X]=[Y]]:[[[X]subset[Y]][[Y]subset[X]]]][[[X]subset[Y]][[Y]subset[X]]:[[X]=[Y]]]]",
        );
        axiom
    }

    /// Restricted comprehension: every set has the subset of its elements
    /// satisfying `statement`, where `var` names the element variable and
    /// `context` binds the statement's parameters. The set and witness
    /// names are chosen fresh against the statement's own variables.
    pub fn comprehension(statement: &str, var: &str, context: &str) -> Proposition {
        let mut axiom = Proposition::new("Sets: Restricted Comprehension");
        let taken = match Statement::parse(
            &format!("{}{}[{}]", statement, context, var),
            axiom.notation(),
        ) {
            Ok(st) => st.variables(),
            Err(_) => Vec::new(),
        };
        let set_var = fresh_name("X", &taken, axiom.notation());
        let witness = fresh_name("y", &taken, axiom.notation());
        let subset = format!("[[{v}]in[{x}]|{stat}]", v = var, x = set_var, stat = statement);
        let member = statement.replace(&format!("[{}]", var), &format!("[{}]", witness));
        axiom.postulate(&format!(
            "[{ctx}[{x}][[{x}]set]:[{s}[{s}set][[[{y}]:[[[{y}]in{s}]={member}]]]]]",
            ctx = context,
            x = set_var,
            s = subset,
            y = witness,
            member = member
        ));
        axiom
    }
}
