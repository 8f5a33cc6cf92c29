//! Tree model of the bracket language. A statement is a sequence of top
//! level bracket groups; a group interior interleaves constant runs with
//! nested groups. The tree is kept in canonical form (constant runs are
//! non-empty and never adjacent) so derived structural equality coincides
//! with textual equality of the rendered form.

use crate::notation::Notation;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::fmt::{Debug, Display};
use core::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One element of a group interior.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Item {
    /// A maximal run of non-bracket characters. Never empty.
    Constant(String),
    /// A nested bracket group.
    Group(Group),
}

/// A single bracket group, e.g. `[x]` or `[[x]in[M]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    items: Vec<Item>,
}

impl Group {
    /// Build a group from raw items, normalizing to canonical form: empty
    /// constants are dropped and adjacent constants are merged.
    pub fn new(items: Vec<Item>) -> Self {
        let mut normal: Vec<Item> = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Constant(c) => {
                    if c.is_empty() {
                        continue;
                    }
                    if let Some(Item::Constant(prev)) = normal.last_mut() {
                        prev.push_str(&c);
                    } else {
                        normal.push(Item::Constant(c));
                    }
                }
                group => normal.push(group),
            }
        }
        Group { items: normal }
    }

    /// The empty group `[]`.
    pub fn empty() -> Self {
        Group { items: Vec::new() }
    }

    /// The group `[name]` binding or mentioning a variable.
    pub fn variable(name: &str) -> Self {
        Group {
            items: alloc::vec![Item::Constant(name.to_string())],
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The variable named by this group: a group consisting of a single
    /// bare constant names a variable.
    pub fn variable_name(&self) -> Option<&str> {
        match self.items.as_slice() {
            [Item::Constant(name)] => Some(name),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.variable_name().is_some()
    }

    /// Split the interior into constant runs and the statement runs between
    /// them. Conventions follow the source language: a leading empty constant
    /// is recorded iff the interior starts with a group, consecutive groups
    /// coalesce into one statement run, and no trailing empty constant is
    /// recorded. `[]` decomposes to `([""], [])` and `[x]` to `(["x"], [])`.
    pub fn decompose(&self) -> (Vec<String>, Vec<Statement>) {
        let mut constants: Vec<String> = Vec::new();
        let mut statements: Vec<Statement> = Vec::new();
        let mut run: Vec<Group> = Vec::new();
        for item in &self.items {
            match item {
                Item::Group(g) => {
                    if constants.is_empty() {
                        constants.push(String::new());
                    }
                    run.push(g.clone());
                }
                Item::Constant(c) => {
                    if !run.is_empty() {
                        statements.push(Statement {
                            groups: mem::take(&mut run),
                        });
                    }
                    constants.push(c.clone());
                }
            }
        }
        if !run.is_empty() {
            statements.push(Statement { groups: run });
        }
        if constants.is_empty() {
            constants.push(String::new());
        }
        (constants, statements)
    }

    /// View the group as an argument: statement runs joined by the
    /// implication separator, as in `[[a]:[b]]` or chained `[[a]:[b]:[c]]`.
    /// Returns the runs (at least two) or `None`.
    pub fn argument(&self, no: &Notation) -> Option<Vec<Statement>> {
        let (constants, statements) = self.decompose();
        if statements.len() < 2 || constants.len() != statements.len() {
            return None;
        }
        if !constants[0].is_empty() {
            return None;
        }
        let mut separator = String::new();
        separator.push(no.implication());
        if constants[1..].iter().any(|c| *c != separator) {
            return None;
        }
        Some(statements)
    }

    /// View the group as an equation `[lhs = rhs]` between two groups.
    pub fn equation(&self, no: &Notation) -> Option<(Group, Group)> {
        match self.items.as_slice() {
            [Item::Group(lhs), Item::Constant(c), Item::Group(rhs)] => {
                let mut separator = String::new();
                separator.push(no.equality());
                if *c == separator {
                    Some((lhs.clone(), rhs.clone()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// The equation group `[lhs = rhs]`.
    pub fn equation_of(lhs: &Group, rhs: &Group, no: &Notation) -> Group {
        Group {
            items: alloc::vec![
                Item::Group(lhs.clone()),
                Item::Constant(no.equality().to_string()),
                Item::Group(rhs.clone()),
            ],
        }
    }

    /// Every variable occurring at any depth, in reading order, duplicates
    /// preserved.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        if let Some(name) = self.variable_name() {
            out.push(name.to_string());
            return;
        }
        for item in &self.items {
            if let Item::Group(g) = item {
                g.collect_variables(out);
            }
        }
    }

    pub fn render(&self, no: &Notation) -> String {
        let mut out = String::new();
        self.render_into(&mut out, no);
        out
    }

    fn render_into(&self, out: &mut String, no: &Notation) {
        out.push(no.open());
        for item in &self.items {
            match item {
                Item::Constant(c) => out.push_str(c),
                Item::Group(g) => g.render_into(out, no),
            }
        }
        out.push(no.close());
    }
}

/// A non-empty sequence of top level groups. The empty statement is `[]`,
/// a single empty group.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statement {
    groups: Vec<Group>,
}

impl Statement {
    /// Parse bracket text into a statement.
    ///
    /// ```
    /// use synapsis::{Notation, Statement};
    ///
    /// let no = Notation::default();
    /// let st = Statement::parse("[x][[x]in[M]]", &no).unwrap();
    /// assert_eq!(st.groups().len(), 2);
    /// assert_eq!(st.render(&no), "[x][[x]in[M]]");
    /// assert!(Statement::parse("[x", &no).is_err());
    /// assert!(Statement::parse("x[y]", &no).is_err());
    /// ```
    pub fn parse(text: &str, no: &Notation) -> Result<Self, ParseError> {
        let mut parser = Parser {
            source: text.chars(),
            no,
        };
        let items = parser.items(false)?;
        if items.is_empty() {
            return Err(ParseError::InvalidStatement);
        }
        let mut groups = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Group(g) => groups.push(g),
                Item::Constant(_) => return Err(ParseError::InvalidStatement),
            }
        }
        Ok(Statement { groups })
    }

    /// The empty statement `[]`.
    pub fn empty() -> Self {
        Statement {
            groups: alloc::vec![Group::empty()],
        }
    }

    pub fn singleton(group: Group) -> Self {
        Statement {
            groups: alloc::vec![group],
        }
    }

    /// Build a statement from top level groups; no groups yields the empty
    /// statement.
    pub fn from_groups(groups: Vec<Group>) -> Self {
        if groups.is_empty() {
            Statement::empty()
        } else {
            Statement { groups }
        }
    }

    /// The statement `[a][b]...` mentioning each named variable, or the
    /// empty statement when there are none.
    pub fn of_variables(names: &[String]) -> Self {
        Statement::from_groups(names.iter().map(|n| Group::variable(n)).collect())
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].items().is_empty()
    }

    /// Every variable at any depth, reading order, duplicates preserved.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        for g in &self.groups {
            g.collect_variables(&mut out);
        }
        out
    }

    /// Names of the top level groups that are bare variables, in order.
    pub fn context(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter_map(|g| g.variable_name().map(ToString::to_string))
            .collect()
    }

    /// Prepend the context group `[name]`.
    pub fn prefixed_with_variable(&self, name: &str) -> Statement {
        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        groups.push(Group::variable(name));
        groups.extend(self.groups.iter().cloned());
        Statement { groups }
    }

    /// The single-group statement `[antecedent : consequent]`.
    pub fn implication_of(antecedent: &Statement, consequent: &Statement, no: &Notation) -> Self {
        let mut items = Vec::with_capacity(antecedent.groups.len() + consequent.groups.len() + 1);
        items.extend(antecedent.groups.iter().cloned().map(Item::Group));
        items.push(Item::Constant(no.implication().to_string()));
        items.extend(consequent.groups.iter().cloned().map(Item::Group));
        Statement::singleton(Group { items })
    }

    pub fn render(&self, no: &Notation) -> String {
        let mut out = String::new();
        for g in &self.groups {
            g.render_into(&mut out, no);
        }
        out
    }
}

struct Parser<'a> {
    source: core::str::Chars<'a>,
    no: &'a Notation,
}

impl<'a> Parser<'a> {
    fn items(&mut self, nested: bool) -> Result<Vec<Item>, ParseError> {
        let mut items: Vec<Item> = Vec::new();
        let mut constant = String::new();
        loop {
            match self.source.next() {
                None => {
                    if nested {
                        // unclosed group
                        return Err(ParseError::InvalidExpression);
                    }
                    break;
                }
                Some(c) if c == self.no.open() => {
                    flush(&mut items, &mut constant);
                    let interior = self.items(true)?;
                    items.push(Item::Group(Group { items: interior }));
                }
                Some(c) if c == self.no.close() => {
                    if nested {
                        flush(&mut items, &mut constant);
                        return Ok(items);
                    }
                    // stray closing bracket
                    return Err(ParseError::InvalidExpression);
                }
                Some(c) => constant.push(c),
            }
        }
        flush(&mut items, &mut constant);
        Ok(items)
    }
}

fn flush(items: &mut Vec<Item>, constant: &mut String) {
    if !constant.is_empty() {
        items.push(Item::Constant(mem::take(constant)));
    }
}

/// Whether the text is a balanced bracket expression: the running bracket
/// count never drops below zero and ends at zero. The empty text is valid.
pub fn is_valid_expression(text: &str, no: &Notation) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        if c == no.open() {
            depth += 1;
        } else if c == no.close() {
            match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            }
        }
    }
    depth == 0
}

/// Whether the text parses as a statement: a valid expression whose depth
/// zero characters are all brackets, with at least one group.
pub fn is_valid_statement(text: &str, no: &Notation) -> bool {
    Statement::parse(text, no).is_ok()
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParseError {
    /// Brackets are unbalanced.
    InvalidExpression,
    /// Balanced, but not a sequence of bracket groups (constants at depth
    /// zero, or no groups at all).
    InvalidStatement,
}

impl Display for ParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::*;

    fn no() -> Notation {
        Notation::default()
    }

    fn parse(text: &str) -> Statement {
        Statement::parse(text, &no()).unwrap()
    }

    #[test]
    fn expression_validity() {
        assert!(is_valid_expression("[x][y]", &no()));
        assert!(is_valid_expression("a[b]c", &no()));
        assert!(is_valid_expression("", &no()));
        assert!(!is_valid_expression("[", &no()));
        assert!(!is_valid_expression("]", &no()));
        assert!(!is_valid_expression("][", &no()));
    }

    #[test]
    fn statement_validity() {
        assert!(is_valid_statement("[x]", &no()));
        assert!(is_valid_statement("[x][[x]in[M]]", &no()));
        assert!(!is_valid_statement("", &no()));
        assert!(!is_valid_statement("a[x]", &no()));
        assert!(!is_valid_statement("[x]b", &no()));
        assert!(!is_valid_statement("[x", &no()));
    }

    #[test]
    fn render_round_trip() {
        for text in &[
            "[]",
            "[x]",
            "[[x]+[y]][[[x]+[y]]in[M]]",
            "[[a]:[b]:[c]]",
            "[[[0[]]=[1+[n]]]]",
        ] {
            assert_eq!(parse(text).render(&no()), *text);
        }
    }

    #[test]
    fn variable_groups() {
        assert!(parse("[x]").groups()[0].is_variable());
        assert!(!parse("[]").groups()[0].is_variable());
        assert!(!parse("[[x]]").groups()[0].is_variable());
        assert_eq!(parse("[x]").groups()[0].variable_name(), Some("x"));
    }

    #[test]
    fn decomposition_conventions() {
        let (cons, stats) = parse("[]").groups()[0].decompose();
        assert_eq!(cons, &[""]);
        assert!(stats.is_empty());

        let (cons, stats) = parse("[x]").groups()[0].decompose();
        assert_eq!(cons, &["x"]);
        assert!(stats.is_empty());

        let (cons, stats) = parse("[[a][b]:[c]]").groups()[0].decompose();
        assert_eq!(cons, &["", ":"]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].render(&no()), "[a][b]");
        assert_eq!(stats[1].render(&no()), "[c]");

        // consecutive groups make one run
        let (cons, stats) = parse("[[a][b]]").groups()[0].decompose();
        assert_eq!(cons, &[""]);
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn argument_views() {
        let g = parse("[[a]:[b]]").groups()[0].clone();
        let runs = g.argument(&no()).unwrap();
        assert_eq!(runs.len(), 2);

        let chained = parse("[[a]:[b]:[c]]").groups()[0].clone();
        assert_eq!(chained.argument(&no()).unwrap().len(), 3);

        assert!(parse("[[a][b]]").groups()[0].argument(&no()).is_none());
        assert!(parse("[[a]x[b]]").groups()[0].argument(&no()).is_none());
        assert!(parse("[[a]:[b]x]").groups()[0].argument(&no()).is_none());
    }

    #[test]
    fn equation_views() {
        let g = parse("[[c]=[d]]").groups()[0].clone();
        let (l, r) = g.equation(&no()).unwrap();
        assert_eq!(l.render(&no()), "[c]");
        assert_eq!(r.render(&no()), "[d]");

        assert!(parse("[[c][c]=[d]]").groups()[0].equation(&no()).is_none());
        assert!(parse("[[c]:[d]]").groups()[0].equation(&no()).is_none());
    }

    #[test]
    fn variable_collection() {
        let st = parse("[x][[x]in[M]][[y]]");
        assert_eq!(st.variables(), &["x", "x", "M", "y"]);
        assert_eq!(st.context(), &["x"]);
    }

    #[test]
    fn builders() {
        let a = parse("[a][b]");
        let b = parse("[c]");
        assert_eq!(
            Statement::implication_of(&a, &b, &no()).render(&no()),
            "[[a][b]:[c]]"
        );
        assert_eq!(a.prefixed_with_variable("z").render(&no()), "[z][a][b]");
        assert_eq!(
            Statement::of_variables(&["x".into(), "y".into()]).render(&no()),
            "[x][y]"
        );
        assert_eq!(Statement::of_variables(&[]).render(&no()), "[]");
    }

    #[test]
    fn canonical_construction() {
        let g = Group::new(alloc::vec![
            Item::Constant("".into()),
            Item::Constant("a".into()),
            Item::Constant("b".into()),
            Item::Group(Group::empty()),
        ]);
        assert_eq!(g.render(&no()), "[ab[]]");
        assert_eq!(g, parse("[ab[]]").groups()[0]);
    }
}
