extern crate alloc;
extern crate core;

mod context;
mod hygiene;
mod log;
mod notation;
mod proposition;
mod statement;
mod subst;
mod theories;


pub use crate::log::{Diagnostic, Fault, Justification, Line, Step};
pub use crate::notation::{BadNotation, Notation};
pub use crate::proposition::{Concretization, Incomplete, Kind, Proposition};
pub use crate::statement::{
    is_valid_expression, is_valid_statement, Group, Item, ParseError, Statement,
};
pub use crate::theories::{Arithmetic, Boolean, Sets};
