//! The proof log: one `Line` per deduction step, each carrying its
//! statement, justification and assumption depth, plus the diagnostics
//! recorded by failed steps. Append-only while a proof is under
//! construction; the newest line can be deleted.

use crate::statement::Statement;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Names of the deduction steps that can produce placeholder lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Step {
    Restatement,
    Recall,
    SelfEquation,
    Application,
    LeftSubstitution,
    RightSubstitution,
    Synapsis,
}

impl Display for Step {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let name = match self {
            Step::Restatement => "restatement",
            Step::Recall => "recall",
            Step::SelfEquation => "self-equation",
            Step::Application => "application",
            Step::LeftSubstitution => "left substitution",
            Step::RightSubstitution => "right substitution",
            Step::Synapsis => "synapsis",
        };
        fmt.write_str(name)
    }
}

/// How a line entered the proof. Line and position references are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Justification {
    Assumption,
    Restatement {
        sources: Vec<usize>,
    },
    Recall {
        name: String,
    },
    SelfEquation {
        line: usize,
        position: usize,
    },
    /// Concretizations are recorded in rendered form, `_` for a variable
    /// deliberately left abstract.
    Application {
        line: usize,
        position: usize,
        concretizations: Vec<String>,
    },
    LeftSubstitution {
        equation: (usize, usize),
        target: (usize, usize),
    },
    RightSubstitution {
        equation: (usize, usize),
        target: (usize, usize),
    },
    Synapsis {
        first: usize,
        last: usize,
    },
    /// Placeholder line appended by a failed step.
    Void(Step),
}

impl Display for Justification {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Justification::Assumption => fmt.write_str("assumption"),
            Justification::Restatement { sources } => {
                fmt.write_str("restatement (see line")?;
                if sources.len() > 1 {
                    fmt.write_str("s")?;
                }
                for s in sources {
                    write!(fmt, " {}", s)?;
                }
                fmt.write_str(")")
            }
            Justification::Recall { name } => write!(fmt, "recalling \"{}\"", name),
            Justification::SelfEquation { line, position } => {
                write!(fmt, "self-equation from L{}({})", line, position)
            }
            Justification::Application {
                line,
                position,
                concretizations,
            } => {
                write!(fmt, "application of L{}({})", line, position)?;
                if !concretizations.is_empty() {
                    fmt.write_str(" with")?;
                    for c in concretizations {
                        write!(fmt, " {}", c)?;
                    }
                }
                Ok(())
            }
            Justification::LeftSubstitution { equation, target } => write!(
                fmt,
                "left substitution of L{}({}) in L{}({})",
                equation.0, equation.1, target.0, target.1
            ),
            Justification::RightSubstitution { equation, target } => write!(
                fmt,
                "right substitution of L{}({}) in L{}({})",
                equation.0, equation.1, target.0, target.1
            ),
            Justification::Synapsis { first, last } => {
                write!(fmt, "synapsis (L{}-L{})", first, last)
            }
            Justification::Void(step) => write!(fmt, "{} (void)", step),
        }
    }
}

/// One line of a proof.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Line {
    pub statement: Statement,
    pub justification: Justification,
    /// Assumption nesting depth; 0 outside any block.
    pub depth: usize,
}

/// The reasons a deduction step can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Fault {
    /// Input text with unbalanced brackets.
    InvalidExpression,
    /// Balanced input text that is not a statement.
    InvalidStatement,
    /// Line reference outside the proof.
    InvalidLineReference,
    /// Referenced line sits inside an already closed block.
    InaccessibleLine,
    /// Position reference outside the referenced statement.
    InvalidPositionReference,
    /// Cited line is not an implication, or a premise of it could not be
    /// found on any accessible line.
    InvalidInference,
    /// Cited position does not hold an equation.
    UnrecognizedEquality,
    /// Recalled proposition has no final statement yet.
    VoidRecall,
    /// Synapsis at depth zero.
    NoOpenBlock,
    /// A requested variable name is already bound in the current scope.
    ReservedContextVariable,
    /// Finalization attempted inside an open assumption block.
    UnclosedAssumption,
    /// Step attempted on an axiom or a finalized theorem.
    ImmutableProposition,
}

impl Display for Fault {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let msg = match self {
            Fault::InvalidExpression => "invalid expression",
            Fault::InvalidStatement => "invalid statement",
            Fault::InvalidLineReference => "invalid line reference",
            Fault::InaccessibleLine => "line not accessible from here",
            Fault::InvalidPositionReference => "invalid position reference",
            Fault::InvalidInference => "invalid inference",
            Fault::UnrecognizedEquality => "unrecognized equality",
            Fault::VoidRecall => "void recall",
            Fault::NoOpenBlock => "no assumption block to close",
            Fault::ReservedContextVariable => "reserved context variable",
            Fault::UnclosedAssumption => "unclosed assumption block",
            Fault::ImmutableProposition => "proposition can no longer change",
        };
        fmt.write_str(msg)
    }
}

/// A recorded failure, tied to the (1-based) line the failing step produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    pub line: usize,
    pub kind: Fault,
}

impl Display for Diagnostic {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(fmt, "L{}: {}", self.line, self.kind)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct Log {
    lines: Vec<Line>,
    diagnostics: Vec<Diagnostic>,
}

impl Log {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Depth of the newest line; 0 for an empty log.
    pub fn last_depth(&self) -> usize {
        self.lines.last().map(|l| l.depth).unwrap_or(0)
    }

    pub fn depths(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.depth).collect()
    }

    /// The depth sequence extended by the depth of a line about to be
    /// appended, so accessibility can be judged from the new line's view.
    pub fn depths_with(&self, staged: usize) -> Vec<usize> {
        let mut depths = self.depths();
        depths.push(staged);
        depths
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn pop(&mut self) -> Option<Line> {
        self.lines.pop()
    }

    pub fn report(&mut self, kind: Fault, line: usize) {
        self.diagnostics.push(Diagnostic { line, kind });
    }
}
