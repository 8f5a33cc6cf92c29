//! The reserved symbols of the proof language. Every proposition owns a
//! `Notation`; statements are parsed and rendered relative to it.

use core::fmt;
use core::fmt::{Debug, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symbol table for the bracket language. Immutable once constructed, so two
/// propositions with different notations can coexist in the same process.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Notation {
    open: char,
    close: char,
    implication: char,
    equality: char,
    falsum: char,
    disjunction: char,
    prime: char,
    prime_bound: usize,
}

impl Notation {
    /// Build a notation from the seven reserved symbols and the bound on
    /// prime marks tried before fresh names fall back to numeric suffixes.
    ///
    /// ```
    /// use synapsis::Notation;
    ///
    /// let curly = Notation::create('{', '}', ':', '=', '!', '?', '\'', 3);
    /// assert!(curly.is_ok());
    /// assert!(Notation::create('[', '[', ':', '=', '!', '?', '\'', 3).is_err());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        open: char,
        close: char,
        implication: char,
        equality: char,
        falsum: char,
        disjunction: char,
        prime: char,
        prime_bound: usize,
    ) -> Result<Self, BadNotation> {
        let symbols = [
            open,
            close,
            implication,
            equality,
            falsum,
            disjunction,
            prime,
        ];
        for (i, a) in symbols.iter().enumerate() {
            if symbols[i + 1..].contains(a) {
                return Err(BadNotation::ClashingSymbols(*a));
            }
        }
        Ok(Notation {
            open,
            close,
            implication,
            equality,
            falsum,
            disjunction,
            prime,
            prime_bound,
        })
    }

    pub fn open(&self) -> char {
        self.open
    }

    pub fn close(&self) -> char {
        self.close
    }

    pub fn implication(&self) -> char {
        self.implication
    }

    pub fn equality(&self) -> char {
        self.equality
    }

    pub fn falsum(&self) -> char {
        self.falsum
    }

    pub fn disjunction(&self) -> char {
        self.disjunction
    }

    pub fn prime(&self) -> char {
        self.prime
    }

    pub fn prime_bound(&self) -> usize {
        self.prime_bound
    }
}

impl Default for Notation {
    fn default() -> Self {
        Notation {
            open: '[',
            close: ']',
            implication: ':',
            equality: '=',
            falsum: '!',
            disjunction: '?',
            prime: '\'',
            prime_bound: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BadNotation {
    /// The same character was given for two reserved symbols.
    ClashingSymbols(char),
}

impl Display for BadNotation {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BadNotation {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_symbols() {
        let no = Notation::default();
        assert_eq!(no.open(), '[');
        assert_eq!(no.close(), ']');
        assert_eq!(no.implication(), ':');
        assert_eq!(no.equality(), '=');
        assert_eq!(no.prime_bound(), 3);
    }

    #[test]
    fn clash_is_rejected() {
        assert_eq!(
            Notation::create('[', ']', ':', ':', '!', '?', '\'', 3),
            Err(BadNotation::ClashingSymbols(':'))
        );
    }
}
