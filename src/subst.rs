//! Occurrence-counted substitution over statement trees.
//!
//! Occurrences of the pattern group are numbered 1, 2, ... in reading order
//! across the whole statement, at any depth, and the numbering always refers
//! to the original tree: selecting occurrences never shifts under earlier
//! replacements in the same pass.

use crate::statement::{Group, Item, Statement};
use alloc::vec::Vec;

/// Replace occurrences of `pattern` within `statement` by the groups of
/// `replacement`, spliced in place. An empty `occurrences` list replaces
/// every occurrence; otherwise exactly the listed 1-based occurrences are
/// replaced.
pub fn substitute(
    statement: &Statement,
    pattern: &Group,
    replacement: &Statement,
    occurrences: &[usize],
) -> Statement {
    let mut counter = 0usize;
    let groups = splice_run(
        statement.groups(),
        pattern,
        replacement,
        occurrences,
        &mut counter,
    );
    Statement::from_groups(groups)
}

/// Rename every occurrence of the variable `from` to `to`.
pub fn rename_variable(statement: &Statement, from: &str, to: &str) -> Statement {
    substitute(
        statement,
        &Group::variable(from),
        &Statement::singleton(Group::variable(to)),
        &[],
    )
}

fn selected(occurrences: &[usize], n: usize) -> bool {
    occurrences.is_empty() || occurrences.contains(&n)
}

fn splice_run(
    groups: &[Group],
    pattern: &Group,
    replacement: &Statement,
    occurrences: &[usize],
    counter: &mut usize,
) -> Vec<Group> {
    let mut out: Vec<Group> = Vec::with_capacity(groups.len());
    for g in groups {
        if g == pattern {
            *counter += 1;
            if selected(occurrences, *counter) {
                out.extend(replacement.groups().iter().cloned());
                continue;
            }
            // a group equal to the pattern cannot contain the pattern
            out.push(g.clone());
        } else {
            out.push(rebuild(g, pattern, replacement, occurrences, counter));
        }
    }
    out
}

fn rebuild(
    group: &Group,
    pattern: &Group,
    replacement: &Statement,
    occurrences: &[usize],
    counter: &mut usize,
) -> Group {
    let mut items: Vec<Item> = Vec::with_capacity(group.items().len());
    for item in group.items() {
        match item {
            Item::Constant(c) => items.push(Item::Constant(c.clone())),
            Item::Group(g) => {
                if g == pattern {
                    *counter += 1;
                    if selected(occurrences, *counter) {
                        items.extend(replacement.groups().iter().cloned().map(Item::Group));
                        continue;
                    }
                    items.push(Item::Group(g.clone()));
                } else {
                    items.push(Item::Group(rebuild(
                        g,
                        pattern,
                        replacement,
                        occurrences,
                        counter,
                    )));
                }
            }
        }
    }
    Group::new(items)
}
