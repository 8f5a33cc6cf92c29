//! Proof construction. A [`Proposition`] is either an axiom, postulated in
//! one step, or a theorem built line by line with the deduction steps. Steps
//! never panic and never refuse to append: a step that cannot be justified
//! records a [`Fault`] and appends a placeholder line, so the line numbering
//! a proof script relies on stays stable. A proposition only becomes
//! recallable once [`Proposition::finalize`] succeeds, and it can only
//! succeed when no fault was ever recorded.

use crate::context::{accessible, block_start, context_vars, influencing_vars};
use crate::hygiene::{resolve, revise_for_scope};
use crate::log::{Diagnostic, Fault, Justification, Line, Log, Step};
use crate::notation::Notation;
use crate::statement::{Group, Item, ParseError, Statement};
use crate::subst::{rename_variable, substitute};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::convert::TryInto;
use core::fmt;
use core::fmt::{Debug, Display, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a proposition is once finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Kind {
    Theorem,
    Axiom,
}

/// How to instantiate one abstract variable during [`Proposition::apply`].
/// Line and position references are 1-based. Fewer concretizations than
/// abstract variables leaves the remaining variables uninstantiated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Concretization {
    /// The group at `position` of line `line`.
    At(usize, usize),
    /// The first group of the given line.
    Line(usize),
    /// A literal statement.
    Value(Statement),
    /// Deliberately leave this variable abstract.
    Keep,
}

/// Why [`Proposition::finalize`] refused to publish a final statement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Incomplete {
    /// Nothing was deduced yet.
    EmptyProof,
    /// The proof still sits inside an assumption block this deep.
    OpenAssumption { depth: usize },
    /// This many faults were recorded during construction.
    Faulty { faults: usize },
}

impl Display for Incomplete {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Incomplete {}

enum Side {
    Left,
    Right,
}

/// A named axiom or theorem under construction.
///
/// ```
/// use synapsis::{Concretization, Proposition};
///
/// let mut binary = Proposition::new("Semigroup: Binary operation");
/// binary.postulate("[[M][semigroup[M]][x][[x]in[M]][y][[y]in[M]]:[[x]+[y]][[[x]+[y]]in[M]]]");
///
/// let mut ternary = Proposition::new("Semigroup: Ternary operation");
/// let l1 = ternary.assume("[M][semigroup[M]][x][[x]in[M]][y][[y]in[M]][z][[z]in[M]]");
/// let l2 = ternary.recall(&binary);
/// let l3 = ternary.apply(
///     l2,
///     &[
///         Concretization::At(l1, 1),
///         Concretization::At(l1, 3),
///         Concretization::At(l1, 5),
///     ],
///     None,
/// );
/// ternary.apply(
///     l2,
///     &[
///         Concretization::At(l1, 1),
///         Concretization::At(l3, 1),
///         Concretization::At(l1, 7),
///     ],
///     None,
/// );
/// ternary.synapsis();
/// let statement = ternary.finalize().unwrap();
/// assert!(ternary.diagnostics().is_empty());
/// assert_eq!(
///     statement.render(ternary.notation()),
///     "[[M][semigroup[M]][x][[x]in[M]][y][[y]in[M]][z][[z]in[M]]\
///      :[[[x]+[y]]+[z]][[[[x]+[y]]+[z]]in[M]]]"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Proposition {
    name: String,
    kind: Kind,
    finalized: bool,
    scoped: bool,
    notation: Notation,
    log: Log,
    final_statement: Option<Statement>,
}

impl Proposition {
    /// An empty theorem-to-be under the default notation.
    pub fn new(name: &str) -> Self {
        Proposition::with_notation(name, Notation::default(), false)
    }

    /// Like [`Proposition::new`], but synapsis additionally resolves the
    /// closed block's assumption and conclusion against the outer context.
    pub fn new_scoped(name: &str) -> Self {
        Proposition::with_notation(name, Notation::default(), true)
    }

    pub fn with_notation(name: &str, notation: Notation, scoped: bool) -> Self {
        Proposition {
            name: name.to_string(),
            kind: Kind::Theorem,
            finalized: false,
            scoped,
            notation,
            log: Log::default(),
            final_statement: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn notation(&self) -> &Notation {
        &self.notation
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Current assumption nesting depth.
    pub fn depth(&self) -> usize {
        self.log.last_depth()
    }

    pub fn lines(&self) -> &[Line] {
        self.log.lines()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.log.diagnostics()
    }

    /// The published statement; `None` until finalization succeeds.
    pub fn final_statement(&self) -> Option<&Statement> {
        self.final_statement.as_ref()
    }

    /// Turn the empty proposition into a finalized axiom. Returns whether
    /// the axiom text was a valid statement; an invalid one still yields an
    /// axiom, but a vacuous one asserting `[]`.
    pub fn postulate(&mut self, text: &str) -> bool {
        if self.finalized || !self.log.is_empty() {
            self.report_next(Fault::ImmutableProposition);
            return false;
        }
        self.kind = Kind::Axiom;
        self.finalized = true;
        let statement = match Statement::parse(text, &self.notation) {
            Ok(st) => st,
            Err(e) => {
                self.report_next(parse_fault(e));
                Statement::empty()
            }
        };
        let ok = self.log.diagnostics().is_empty();
        self.final_statement = Some(statement);
        ok
    }

    /// Open an assumption block with the given statement; depth grows by
    /// one. Empty text assumes the empty statement. Invalid text records a
    /// fault and assumes the empty statement. The stored statement may
    /// differ from the input by hygienic renaming of its bound variables.
    /// Returns the new line number.
    pub fn assume(&mut self, text: &str) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth() + 1;
        let statement = if text.is_empty() {
            Statement::empty()
        } else {
            match Statement::parse(text, &self.notation) {
                Ok(st) => st,
                Err(e) => {
                    self.report_next(parse_fault(e));
                    Statement::empty()
                }
            }
        };
        let depths = self.log.depths_with(depth);
        let context = context_vars(self.log.lines(), &depths, n, 0);
        let reserved = influencing_vars(self.log.lines(), &depths, n);
        let statement = revise_for_scope(&context, &reserved, &statement, &self.notation);
        self.log.push(Line {
            statement,
            justification: Justification::Assumption,
            depth,
        });
        self.log.len()
    }

    /// Copy parts of accessible lines into a new line at the current depth.
    /// Each source is a line number with an optional group position; no
    /// position takes the whole cited statement, and an out-of-range
    /// position falls back to the whole statement with a fault recorded.
    /// `new_vars` renames the free (non-context, non-bound) variables of
    /// each copied part, in order of occurrence.
    pub fn restate(&mut self, sources: &[(usize, Option<usize>)], new_vars: &[&str]) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth();
        let depths = self.log.depths_with(depth);
        let context = context_vars(self.log.lines(), &depths, n, 0);
        let mut gathered: Vec<Group> = Vec::new();
        let mut used: Vec<usize> = Vec::new();
        for &(lineno, position) in sources {
            if lineno < 1 || lineno > n {
                self.report_next(Fault::InvalidLineReference);
                continue;
            }
            if !accessible(&depths, lineno - 1, n - 1) {
                self.report_next(Fault::InaccessibleLine);
                continue;
            }
            let cited = self.log.lines()[lineno - 1].statement.clone();
            let mut piece = match position {
                None => cited.clone(),
                Some(p) if p >= 1 && p <= cited.groups().len() => {
                    Statement::singleton(cited.groups()[p - 1].clone())
                }
                Some(_) => {
                    self.report_next(Fault::InvalidPositionReference);
                    cited.clone()
                }
            };
            if !new_vars.is_empty() {
                piece = self.rename_free(piece, &context, new_vars);
            }
            used.push(lineno);
            gathered.extend(piece.groups().iter().cloned());
        }
        let line = if used.is_empty() {
            Line {
                statement: Statement::empty(),
                justification: Justification::Void(Step::Restatement),
                depth,
            }
        } else {
            Line {
                statement: Statement::from_groups(gathered),
                justification: Justification::Restatement { sources: used },
                depth,
            }
        };
        self.log.push(line);
        self.log.len()
    }

    fn rename_free(&mut self, piece: Statement, context: &[String], new_vars: &[&str]) -> Statement {
        let piece_context = piece.context();
        let piece_vars = piece.variables();
        let reserved = new_vars
            .iter()
            .any(|x| context.iter().any(|c| c == x) || piece_vars.iter().any(|v| v == x));
        if reserved {
            self.report_next(Fault::ReservedContextVariable);
        }
        let free: Vec<String> = piece_vars
            .iter()
            .filter(|v| !context.contains(v) && !piece_context.contains(v))
            .cloned()
            .collect();
        let mut out = piece;
        for (name, new) in free.iter().zip(new_vars) {
            out = rename_variable(&out, name, new);
        }
        out
    }

    /// Import another proposition's final statement, hygienically renamed
    /// against the current context. Recalling an unfinalized proposition is
    /// void.
    pub fn recall(&mut self, source: &Proposition) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth();
        let depths = self.log.depths_with(depth);
        match source.final_statement() {
            Some(imported) => {
                let context = context_vars(self.log.lines(), &depths, n, 0);
                let reserved = influencing_vars(self.log.lines(), &depths, n);
                let premise = Statement::of_variables(&context);
                let mut resolved = resolve(&[premise, imported.clone()], &[], &self.notation);
                let imported = resolved.swap_remove(1);
                let statement = revise_for_scope(&[], &reserved, &imported, &self.notation);
                self.log.push(Line {
                    statement,
                    justification: Justification::Recall {
                        name: source.name().to_string(),
                    },
                    depth,
                });
            }
            None => {
                self.report_next(Fault::VoidRecall);
                self.log.push(Line {
                    statement: Statement::empty(),
                    justification: Justification::Void(Step::Recall),
                    depth,
                });
            }
        }
        self.log.len()
    }

    /// Append `[S = S]` for the group `S` at the given position (default 1)
    /// of an accessible line.
    pub fn self_equate(&mut self, line: usize, position: Option<usize>) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth();
        let depths = self.log.depths_with(depth);
        let fault = if line < 1 || line > n {
            Some(Fault::InvalidLineReference)
        } else if !accessible(&depths, line - 1, n - 1) {
            Some(Fault::InaccessibleLine)
        } else {
            None
        };
        if let Some(fault) = fault {
            self.report_next(fault);
            return self.push_equation_placeholder(depth);
        }
        let cited = self.log.lines()[line - 1].statement.clone();
        let p = position.unwrap_or(1);
        if p < 1 || p > cited.groups().len() {
            self.report_next(Fault::InvalidPositionReference);
            return self.push_equation_placeholder(depth);
        }
        let group = cited.groups()[p - 1].clone();
        self.log.push(Line {
            statement: Statement::singleton(Group::equation_of(&group, &group, &self.notation)),
            justification: Justification::SelfEquation { line, position: p },
            depth,
        });
        self.log.len()
    }

    fn push_equation_placeholder(&mut self, depth: usize) -> usize {
        self.log.push(Line {
            statement: Statement::singleton(Group::equation_of(
                &Group::empty(),
                &Group::empty(),
                &self.notation,
            )),
            justification: Justification::Void(Step::SelfEquation),
            depth,
        });
        self.log.len()
    }

    /// Apply the implication found at `position` (default 1) of the cited
    /// line. Abstract variables (bare variables of the premise runs that
    /// are not context variables) are instantiated by `concretizations` in
    /// order. After instantiation, every premise group must occur verbatim
    /// as a top level group of some accessible line; the conclusion run is
    /// then appended, scope-revised.
    pub fn apply(
        &mut self,
        line: usize,
        concretizations: &[Concretization],
        position: Option<usize>,
    ) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth();
        let depths = self.log.depths_with(depth);
        let mut faulty = false;
        if line < 1 || line > n {
            self.report_next(Fault::InvalidLineReference);
            faulty = true;
        } else if !accessible(&depths, line - 1, n - 1) {
            self.report_next(Fault::InaccessibleLine);
            faulty = true;
        }
        let context = context_vars(self.log.lines(), &depths, n, 0);

        // resolve concretization references up front; unusable ones are
        // dropped after recording their fault
        let mut concrete: Vec<Option<Statement>> = Vec::new();
        for c in concretizations {
            match c {
                Concretization::Keep => concrete.push(None),
                Concretization::Value(st) => concrete.push(Some(st.clone())),
                Concretization::Line(l) => {
                    if let Some(st) = self.cited_group(*l, 1, n, &depths) {
                        concrete.push(Some(st));
                    }
                }
                Concretization::At(l, p) => {
                    if let Some(st) = self.cited_group(*l, *p, n, &depths) {
                        concrete.push(Some(st));
                    }
                }
            }
        }
        if faulty {
            return self.push_application_placeholder(depth);
        }

        let cited = self.log.lines()[line - 1].statement.clone();
        let mut pos = position.unwrap_or(1);
        if pos < 1 || pos > cited.groups().len() {
            self.report_next(Fault::InvalidPositionReference);
            pos = 1;
        }
        let implication_group = cited.groups()[pos - 1].clone();
        if implication_group.argument(&self.notation).is_none() {
            self.report_next(Fault::InvalidInference);
            return self.push_application_placeholder(depth);
        }

        let segments = implication_group
            .argument(&self.notation)
            .expect("checked above");
        let mut abstract_vars: Vec<String> = Vec::new();
        for segment in &segments[..segments.len() - 1] {
            for g in segment.groups() {
                if let Some(name) = g.variable_name() {
                    if !context.iter().any(|c| c == name)
                        && !abstract_vars.iter().any(|a| a == name)
                    {
                        abstract_vars.push(name.to_string());
                    }
                }
            }
        }

        let mut implication = Statement::singleton(implication_group);
        let mut recorded: Vec<String> = Vec::new();
        for (j, var) in abstract_vars.iter().enumerate() {
            match concrete.get(j) {
                Some(Some(replacement)) => {
                    implication = substitute(&implication, &Group::variable(var), replacement, &[]);
                    recorded.push(replacement.render(&self.notation));
                }
                Some(None) => recorded.push("_".to_string()),
                // no concretization given: the variable stays abstract
                None => {}
            }
        }

        let segments = implication.groups()[0]
            .argument(&self.notation)
            .expect("instantiation preserves the argument shape");
        let (conclusion, premises) = segments
            .split_last()
            .expect("arguments have at least two runs");
        let mut satisfied = true;
        'premises: for premise in premises {
            for g in premise.groups() {
                let present = (0..n).any(|i| {
                    accessible(&depths, i, n) && self.log.lines()[i].statement.groups().contains(g)
                });
                if !present {
                    satisfied = false;
                    break 'premises;
                }
            }
        }
        if !satisfied {
            self.report_next(Fault::InvalidInference);
            return self.push_application_placeholder(depth);
        }
        let reserved = influencing_vars(self.log.lines(), &depths, n);
        let statement = revise_for_scope(&context, &reserved, conclusion, &self.notation);
        self.log.push(Line {
            statement,
            justification: Justification::Application {
                line,
                position: pos,
                concretizations: recorded,
            },
            depth,
        });
        self.log.len()
    }

    fn push_application_placeholder(&mut self, depth: usize) -> usize {
        self.log.push(Line {
            statement: Statement::empty(),
            justification: Justification::Void(Step::Application),
            depth,
        });
        self.log.len()
    }

    fn cited_group(
        &mut self,
        line: usize,
        position: usize,
        n: usize,
        depths: &[usize],
    ) -> Option<Statement> {
        if line < 1 || line > n {
            self.report_next(Fault::InvalidLineReference);
            return None;
        }
        if !accessible(depths, line - 1, n - 1) {
            self.report_next(Fault::InaccessibleLine);
            return None;
        }
        let cited = self.log.lines()[line - 1].statement.clone();
        if position < 1 || position > cited.groups().len() {
            self.report_next(Fault::InvalidPositionReference);
            return None;
        }
        Some(Statement::singleton(cited.groups()[position - 1].clone()))
    }

    /// Rewrite occurrences of the cited equation's right side by its left
    /// side inside the targeted group. The cited group may carry the
    /// equation wrapped in singleton brackets, as assumed equations do.
    /// `occurrences` selects 1-based occurrences counted on the original
    /// tree; empty means all.
    pub fn left_substitute(
        &mut self,
        equation: (usize, Option<usize>),
        target: (usize, Option<usize>),
        occurrences: &[usize],
    ) -> usize {
        self.substitution(Side::Left, equation, target, occurrences)
    }

    /// Rewrite occurrences of the cited equation's left side by its right
    /// side inside the targeted group.
    pub fn right_substitute(
        &mut self,
        equation: (usize, Option<usize>),
        target: (usize, Option<usize>),
        occurrences: &[usize],
    ) -> usize {
        self.substitution(Side::Right, equation, target, occurrences)
    }

    fn substitution(
        &mut self,
        side: Side,
        equation: (usize, Option<usize>),
        target: (usize, Option<usize>),
        occurrences: &[usize],
    ) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let depth = self.log.last_depth();
        let depths = self.log.depths_with(depth);
        let step = match side {
            Side::Left => Step::LeftSubstitution,
            Side::Right => Step::RightSubstitution,
        };
        let (eq_line, eq_position) = (equation.0, equation.1.unwrap_or(1));
        let (t_line, t_position) = (target.0, target.1.unwrap_or(1));
        let mut faulty = false;

        let mut sides: Option<(Group, Group)> = None;
        if eq_line < 1 || eq_line > n {
            self.report_next(Fault::InvalidLineReference);
            faulty = true;
        } else if !accessible(&depths, eq_line - 1, n - 1) {
            self.report_next(Fault::InaccessibleLine);
            faulty = true;
        } else {
            let cited = self.log.lines()[eq_line - 1].statement.clone();
            if eq_position < 1 || eq_position > cited.groups().len() {
                self.report_next(Fault::UnrecognizedEquality);
                faulty = true;
            } else {
                let mut group = cited.groups()[eq_position - 1].clone();
                loop {
                    if let Some(pair) = group.equation(&self.notation) {
                        sides = Some(pair);
                        break;
                    }
                    // equations often arrive wrapped, as in `[[[c]=[d]]]`
                    match group.items() {
                        [Item::Group(inner)] => group = inner.clone(),
                        _ => {
                            self.report_next(Fault::UnrecognizedEquality);
                            faulty = true;
                            break;
                        }
                    }
                }
            }
        }

        let mut target_stat = Statement::empty();
        if t_line < 1 || t_line > n {
            self.report_next(Fault::InvalidLineReference);
            faulty = true;
        } else if !accessible(&depths, t_line - 1, n - 1) {
            self.report_next(Fault::InaccessibleLine);
            faulty = true;
        } else {
            let cited = self.log.lines()[t_line - 1].statement.clone();
            if t_position >= 1 && t_position <= cited.groups().len() {
                target_stat = Statement::singleton(cited.groups()[t_position - 1].clone());
            } else {
                // the step still goes through, rewriting the empty statement
                self.report_next(Fault::InvalidPositionReference);
            }
        }

        if faulty {
            self.log.push(Line {
                statement: Statement::empty(),
                justification: Justification::Void(step),
                depth,
            });
            return self.log.len();
        }

        let (lhs, rhs) = sides.expect("equation extracted when no fault was recorded");
        let context = context_vars(self.log.lines(), &depths, n, 0);
        let resolved = resolve(
            &[
                Statement::singleton(lhs),
                Statement::singleton(rhs),
                target_stat,
            ],
            &context,
            &self.notation,
        );
        let [lhs, rhs, target_stat]: [Statement; 3] =
            resolved.try_into().expect("resolve preserves length");
        let (pattern, replacement) = match side {
            Side::Left => (rhs, lhs),
            Side::Right => (lhs, rhs),
        };
        let pattern = pattern.groups()[0].clone();
        let statement = substitute(&target_stat, &pattern, &replacement, occurrences);
        let justification = match side {
            Side::Left => Justification::LeftSubstitution {
                equation: (eq_line, eq_position),
                target: (t_line, t_position),
            },
            Side::Right => Justification::RightSubstitution {
                equation: (eq_line, eq_position),
                target: (t_line, t_position),
            },
        };
        self.log.push(Line {
            statement,
            justification,
            depth,
        });
        self.log.len()
    }

    /// Close the innermost assumption block, appending
    /// `[assumption : conclusion]` one level up. Variables bound inside the
    /// block that are still free in the conclusion are generalized by
    /// prepending their context groups. At depth zero there is nothing to
    /// close: a fault is recorded and the placeholder `[[]:[]]` appended.
    pub fn synapsis(&mut self) -> usize {
        if self.immutable() {
            return self.log.len();
        }
        let n = self.log.len();
        let current = self.log.last_depth();
        if n == 0 || current == 0 {
            self.report_next(Fault::NoOpenBlock);
            self.log.push(Line {
                statement: Statement::implication_of(
                    &Statement::empty(),
                    &Statement::empty(),
                    &self.notation,
                ),
                justification: Justification::Void(Step::Synapsis),
                depth: 0,
            });
            return self.log.len();
        }
        let depth = current - 1;
        let depths = self.log.depths();
        let start = block_start(&depths, n - 1);
        let lines = self.log.lines();
        let assumption = lines[start].statement.clone();
        let mut conclusion = lines[n - 1].statement.clone();
        let block_context = context_vars(lines, &depths, n - 1, start);
        let outer_context = context_vars(lines, &depths, start, 0);
        let context = context_vars(lines, &depths, n - 1, 0);
        let assumption_context = assumption.context();
        let conclusion_context = conclusion.context();
        let conclusion_vars = conclusion.variables();
        let mut added: Vec<String> = Vec::new();
        for x in &conclusion_vars {
            if block_context.contains(x)
                && !outer_context.contains(x)
                && !conclusion_context.contains(x)
                && !assumption_context.contains(x)
                && !added.contains(x)
            {
                conclusion = conclusion.prefixed_with_variable(x);
                added.push(x.clone());
            }
        }
        let statement = if self.scoped {
            let resolved = resolve(&[assumption, conclusion], &context, &self.notation);
            Statement::implication_of(&resolved[0], &resolved[1], &self.notation)
        } else {
            Statement::implication_of(&assumption, &conclusion, &self.notation)
        };
        self.log.push(Line {
            statement,
            justification: Justification::Synapsis {
                first: start + 1,
                last: n,
            },
            depth,
        });
        self.log.len()
    }

    /// Remove the newest line. Faults already recorded are not retracted, so
    /// deleting a placeholder line does not make the proof finalizable.
    pub fn delete_last(&mut self) -> Option<Line> {
        if self.immutable() {
            return None;
        }
        self.log.pop()
    }

    /// Publish the final statement: the last line, with context variables it
    /// still mentions freely prepended. Succeeds only at depth zero with at
    /// least one line and a clean diagnostic record; success makes the
    /// proposition a finalized theorem, recallable from other proofs.
    pub fn finalize(&mut self) -> Result<Statement, Incomplete> {
        if self.finalized {
            return Ok(self
                .final_statement
                .clone()
                .expect("finalized propositions carry a final statement"));
        }
        let n = self.log.len();
        if n == 0 {
            return Err(Incomplete::EmptyProof);
        }
        let depth = self.log.last_depth();
        if depth != 0 {
            self.log.report(Fault::UnclosedAssumption, n);
            return Err(Incomplete::OpenAssumption { depth });
        }
        let depths = self.log.depths();
        let context = context_vars(self.log.lines(), &depths, n - 1, 0);
        let mut conclusion = self.log.lines()[n - 1].statement.clone();
        if n > 1 {
            let conclusion_vars = conclusion.variables();
            let conclusion_context = conclusion.context();
            let mut added: Vec<String> = Vec::new();
            for x in &conclusion_vars {
                if context.contains(x) && !conclusion_context.contains(x) && !added.contains(x) {
                    conclusion = conclusion.prefixed_with_variable(x);
                    added.push(x.clone());
                }
            }
        }
        let faults = self.log.diagnostics().len();
        if faults > 0 {
            return Err(Incomplete::Faulty { faults });
        }
        self.finalized = true;
        self.final_statement = Some(conclusion.clone());
        Ok(conclusion)
    }

    /// Render the proof as framed text, one line per deduction step, with
    /// assumption blocks drawn in the margin and diagnostics at the end.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let kind = match self.kind {
            Kind::Axiom => "Axiom",
            Kind::Theorem => "Theorem",
        };
        let _ = writeln!(out, "{}: \"{}\"", kind, self.name);
        let depths = self.log.depths();
        for (i, line) in self.log.lines().iter().enumerate() {
            let d = line.depth;
            if d > 0 {
                for _ in 1..d {
                    out.push('║');
                }
                let opened = i == 0 || depths[i - 1] < d;
                let closed = i + 1 < depths.len() && depths[i + 1] < d;
                out.push(match (opened, closed) {
                    (true, true) => '■',
                    (true, false) => '╔',
                    (false, true) => '╚',
                    (false, false) => '║',
                });
            }
            let _ = writeln!(
                out,
                "{} /L{}: {}.",
                line.statement.render(&self.notation),
                i + 1,
                line.justification
            );
        }
        if let Some(st) = &self.final_statement {
            let _ = writeln!(out, "{}", st.render(&self.notation));
        }
        for d in self.log.diagnostics() {
            let _ = writeln!(out, "! {}", d);
        }
        out
    }

    fn immutable(&mut self) -> bool {
        if self.finalized || self.kind == Kind::Axiom {
            self.report_next(Fault::ImmutableProposition);
            true
        } else {
            false
        }
    }

    fn report_next(&mut self, fault: Fault) {
        let line = self.log.len() + 1;
        self.log.report(fault, line);
    }
}

fn parse_fault(e: ParseError) -> Fault {
    match e {
        ParseError::InvalidExpression => Fault::InvalidExpression,
        ParseError::InvalidStatement => Fault::InvalidStatement,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rendered(p: &Proposition, line: usize) -> String {
        p.lines()[line - 1].statement.render(p.notation())
    }

    #[test]
    fn postulate_makes_an_axiom() {
        let mut a = Proposition::new("Identity");
        assert!(a.postulate("[[x][x]]"));
        assert_eq!(a.kind(), Kind::Axiom);
        assert!(a.is_finalized());
        assert_eq!(
            a.final_statement().unwrap().render(a.notation()),
            "[[x][x]]"
        );
        assert!(a.diagnostics().is_empty());
    }

    #[test]
    fn postulate_of_invalid_text_is_vacuous() {
        let mut a = Proposition::new("Broken");
        assert!(!a.postulate("[[x]"));
        assert_eq!(a.kind(), Kind::Axiom);
        assert!(a.final_statement().unwrap().is_empty());
        assert_eq!(a.diagnostics()[0].kind, Fault::InvalidExpression);
    }

    #[test]
    fn axioms_refuse_further_steps() {
        let mut a = Proposition::new("Axiom");
        a.postulate("[[x][x]]");
        let before = a.lines().len();
        assert_eq!(a.assume("[y]"), before);
        assert_eq!(
            a.diagnostics().last().unwrap().kind,
            Fault::ImmutableProposition
        );
    }

    #[test]
    fn assume_tracks_depth() {
        let mut t = Proposition::new("Depths");
        assert_eq!(t.assume("[x]"), 1);
        assert_eq!(t.depth(), 1);
        assert_eq!(t.assume("[y]"), 2);
        assert_eq!(t.depth(), 2);
        t.synapsis();
        assert_eq!(t.depth(), 1);
    }

    #[test]
    fn assume_of_invalid_text_is_a_placeholder() {
        let mut t = Proposition::new("Bad input");
        t.assume("[x");
        assert!(t.lines()[0].statement.is_empty());
        assert_eq!(t.lines()[0].depth, 1);
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidExpression);
        t.assume("x[]");
        assert_eq!(t.diagnostics()[1].kind, Fault::InvalidStatement);
    }

    #[test]
    fn assume_renames_captured_bindings() {
        let mut t = Proposition::new("Hygiene");
        // line 1 mentions x without binding it; binding x now would capture
        t.assume("[[x]q]");
        t.assume("[x][p[x]]");
        assert_eq!(rendered(&t, 2), "[x'][p[x']]");
        // re-binding an actual context variable is fine and stays untouched
        let mut u = Proposition::new("Rebind");
        u.assume("[x][p[x]]");
        u.assume("[x]");
        assert_eq!(rendered(&u, 2), "[x]");
    }

    #[test]
    fn restate_copies_parts() {
        let mut t = Proposition::new("Restate");
        t.assume("[a][b][[a]r[b]]");
        let l2 = t.restate(&[(1, Some(3))], &[]);
        assert_eq!(rendered(&t, l2), "[[a]r[b]]");
        let l3 = t.restate(&[(1, Some(1)), (2, None)], &[]);
        assert_eq!(rendered(&t, l3), "[a][[a]r[b]]");
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn restate_bad_position_takes_whole_statement() {
        let mut t = Proposition::new("Restate");
        t.assume("[a][b]");
        let l2 = t.restate(&[(1, Some(9))], &[]);
        assert_eq!(rendered(&t, l2), "[a][b]");
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidPositionReference);
    }

    #[test]
    fn restate_with_no_usable_source_is_void() {
        let mut t = Proposition::new("Restate");
        t.assume("[a]");
        let l2 = t.restate(&[(7, None)], &[]);
        assert!(t.lines()[l2 - 1].statement.is_empty());
        assert_eq!(
            t.lines()[l2 - 1].justification,
            Justification::Void(Step::Restatement)
        );
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidLineReference);
    }

    #[test]
    fn restate_renames_free_variables() {
        let mut t = Proposition::new("Restate");
        t.assume("[X]");
        t.assume("[x'][set[x']][[x']in[X]]");
        t.restate(&[(2, Some(3))], &[]);
        let l4 = t.synapsis();
        assert_eq!(
            rendered(&t, l4),
            "[[x'][set[x']][[x']in[X]]:[[x']in[X]]]"
        );
        let l5 = t.restate(&[(l4, Some(1))], &["x"]);
        assert_eq!(rendered(&t, l5), "[[x][set[x]][[x]in[X]]:[[x]in[X]]]");
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn restate_refuses_reserved_new_names() {
        let mut t = Proposition::new("Restate");
        t.assume("[a][p[b]]");
        t.restate(&[(1, Some(2))], &["a"]);
        assert_eq!(
            t.diagnostics()[0].kind,
            Fault::ReservedContextVariable
        );
    }

    #[test]
    fn recall_of_unfinalized_proposition_is_void() {
        let unfinished = Proposition::new("Unfinished");
        let mut t = Proposition::new("Recall");
        let l1 = t.recall(&unfinished);
        assert!(t.lines()[l1 - 1].statement.is_empty());
        assert_eq!(t.diagnostics()[0].kind, Fault::VoidRecall);
    }

    #[test]
    fn recall_renames_against_the_context() {
        let mut a = Proposition::new("Axiom");
        a.postulate("[[x]:[q[x]]]");
        let mut t = Proposition::new("Recall");
        t.assume("[x]");
        let l2 = t.recall(&a);
        assert_eq!(rendered(&t, l2), "[[x']:[q[x']]]");
        assert_eq!(
            t.lines()[l2 - 1].justification,
            Justification::Recall {
                name: "Axiom".to_string()
            }
        );
    }

    #[test]
    fn self_equate_appends_an_equation() {
        let mut t = Proposition::new("Equate");
        t.assume("[a][c]");
        let l2 = t.self_equate(1, Some(2));
        assert_eq!(rendered(&t, l2), "[[c]=[c]]");
        let l3 = t.self_equate(1, Some(9));
        assert_eq!(rendered(&t, l3), "[[]=[]]");
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidPositionReference);
    }

    #[test]
    fn apply_instantiates_and_checks_premises() {
        let mut t = Proposition::new("Apply");
        t.assume("[[X]:[b[X]]][a]");
        let l2 = t.apply(1, &[Concretization::At(1, 2)], None);
        assert_eq!(rendered(&t, l2), "[b[a]]");
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn apply_missing_premise_is_an_invalid_inference() {
        let mut t = Proposition::new("Apply");
        t.assume("[[a]:[b]]");
        let l2 = t.apply(1, &[Concretization::Value(
            Statement::parse("[c]", &Notation::default()).unwrap(),
        )], None);
        assert!(t.lines()[l2 - 1].statement.is_empty());
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidInference);
    }

    #[test]
    fn apply_on_a_non_implication_faults() {
        let mut t = Proposition::new("Apply");
        t.assume("[[a][b]]");
        let l2 = t.apply(1, &[], None);
        assert!(t.lines()[l2 - 1].statement.is_empty());
        assert_eq!(t.diagnostics()[0].kind, Fault::InvalidInference);
    }

    #[test]
    fn apply_leaves_unconcretized_variables_abstract() {
        let mut a = Proposition::new("Axiom");
        a.postulate("[[X]:[[X]:[Y]]]");
        let mut t = Proposition::new("Partial");
        let l1 = t.assume("[a]");
        let l2 = t.recall(&a);
        assert_eq!(rendered(&t, l2), "[[X]:[[X]:[Y]]]");
        let l3 = t.apply(l2, &[Concretization::At(l1, 1)], None);
        assert_eq!(rendered(&t, l3), "[[a]:[Y]]");
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn apply_appends_exactly_one_line_on_early_failure() {
        let mut t = Proposition::new("Apply");
        t.assume("[a]");
        let before = t.lines().len();
        let l = t.apply(9, &[Concretization::At(9, 1)], None);
        assert_eq!(l, before + 1);
        assert_eq!(
            t.lines()[l - 1].justification,
            Justification::Void(Step::Application)
        );
    }

    #[test]
    fn substitution_rewrites_by_an_equation() {
        let mut t = Proposition::new("Subst");
        t.assume("[c][d]");
        t.assume("[[[c]=[d]]]");
        t.assume("[[c][c]]");
        let l4 = t.right_substitute((2, Some(1)), (3, Some(1)), &[]);
        assert_eq!(rendered(&t, l4), "[[d][d]]");
        let l5 = t.right_substitute((2, Some(1)), (3, Some(1)), &[2]);
        assert_eq!(rendered(&t, l5), "[[c][d]]");
        let l6 = t.left_substitute((2, Some(1)), (l4, Some(1)), &[1]);
        assert_eq!(rendered(&t, l6), "[[c][d]]");
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn substitution_requires_an_equation() {
        let mut t = Proposition::new("Subst");
        t.assume("[[a][b]]");
        let l2 = t.left_substitute((1, Some(1)), (1, Some(1)), &[]);
        assert!(t.lines()[l2 - 1].statement.is_empty());
        assert_eq!(t.diagnostics()[0].kind, Fault::UnrecognizedEquality);
        assert_eq!(
            t.lines()[l2 - 1].justification,
            Justification::Void(Step::LeftSubstitution)
        );
        // unwrapping stops at a group that is not a singleton wrapper
        t.assume("[[[a][b]]]");
        let l4 = t.right_substitute((3, Some(1)), (3, Some(1)), &[]);
        assert!(t.lines()[l4 - 1].statement.is_empty());
        assert_eq!(t.diagnostics()[1].kind, Fault::UnrecognizedEquality);
    }

    #[test]
    fn synapsis_closes_the_innermost_block() {
        let mut t = Proposition::new("Close");
        t.assume("[X]");
        t.assume("[[X]]");
        let l3 = t.synapsis();
        assert_eq!(rendered(&t, l3), "[[[X]]:[[X]]]");
        assert_eq!(t.lines()[l3 - 1].depth, 1);
        let l4 = t.synapsis();
        assert_eq!(rendered(&t, l4), "[[X]:[[[X]]:[[X]]]]");
        assert_eq!(t.lines()[l4 - 1].depth, 0);
        assert_eq!(
            t.lines()[l4 - 1].justification,
            Justification::Synapsis { first: 1, last: 3 }
        );
    }

    #[test]
    fn synapsis_right_after_assume_restates_the_assumption() {
        let mut t = Proposition::new("Trivial");
        t.assume("[[u]v]");
        let l2 = t.synapsis();
        assert_eq!(rendered(&t, l2), "[[[u]v]:[[u]v]]");
        assert_eq!(t.lines()[l2 - 1].depth, 0);
    }

    #[test]
    fn synapsis_generalizes_block_local_bindings() {
        let mut e = Proposition::new("Witness");
        e.postulate("[w][[w]p]");
        let mut t = Proposition::new("Generalize");
        t.assume("[s]");
        let l2 = t.recall(&e);
        assert_eq!(rendered(&t, l2), "[w][[w]p]");
        t.restate(&[(l2, Some(2))], &[]);
        let l4 = t.synapsis();
        assert_eq!(rendered(&t, l4), "[[s]:[w][[w]p]]");
        assert_eq!(t.lines()[l4 - 1].depth, 0);
    }

    #[test]
    fn synapsis_at_depth_zero_faults() {
        let mut t = Proposition::new("Nothing open");
        let l1 = t.synapsis();
        assert_eq!(rendered(&t, l1), "[[]:[]]");
        assert_eq!(t.diagnostics()[0].kind, Fault::NoOpenBlock);
    }

    #[test]
    fn delete_last_pops_but_keeps_faults() {
        let mut t = Proposition::new("Undo");
        t.assume("[a]");
        t.restate(&[(9, None)], &[]);
        assert_eq!(t.lines().len(), 2);
        let popped = t.delete_last().unwrap();
        assert_eq!(popped.justification, Justification::Void(Step::Restatement));
        assert_eq!(t.lines().len(), 1);
        assert_eq!(t.diagnostics().len(), 1);
    }

    #[test]
    fn finalize_requires_depth_zero() {
        let mut t = Proposition::new("Open");
        t.assume("[x]");
        t.assume("[y]");
        assert_eq!(t.finalize(), Err(Incomplete::OpenAssumption { depth: 2 }));
        assert!(t.final_statement().is_none());
        assert!(!t.is_finalized());
        assert_eq!(
            t.diagnostics().last().unwrap().kind,
            Fault::UnclosedAssumption
        );
    }

    #[test]
    fn finalize_requires_a_clean_record() {
        let mut t = Proposition::new("Faulty");
        t.assume("[x]");
        t.restate(&[(9, None)], &[]);
        t.synapsis();
        assert_eq!(t.finalize(), Err(Incomplete::Faulty { faults: 1 }));
        assert!(t.final_statement().is_none());
    }

    #[test]
    fn finalize_of_an_empty_proof_fails() {
        let mut t = Proposition::new("Empty");
        assert_eq!(t.finalize(), Err(Incomplete::EmptyProof));
    }

    #[test]
    fn finalize_prepends_free_context_variables() {
        let mut w = Proposition::new("Witness");
        w.postulate("[c][[c]ok]");
        let mut t = Proposition::new("Context");
        t.recall(&w);
        let l2 = t.self_equate(1, Some(2));
        assert_eq!(rendered(&t, l2), "[[[c]ok]=[[c]ok]]");
        let statement = t.finalize().unwrap();
        assert_eq!(statement.render(t.notation()), "[c][[[c]ok]=[[c]ok]]");
        assert!(t.is_finalized());
        assert_eq!(t.final_statement(), Some(&statement));
    }

    #[test]
    fn finalized_theorems_are_recallable() {
        let mut t = Proposition::new("Trivial");
        t.assume("[[u]v]");
        t.synapsis();
        t.finalize().unwrap();
        let mut u = Proposition::new("Uses it");
        let l1 = u.recall(&t);
        assert_eq!(rendered(&u, l1), "[[[u]v]:[[u]v]]");
        assert!(u.diagnostics().is_empty());
    }
}
