//! Variable hygiene: fresh-name generation and capture-avoiding renaming
//! used when statements from different scopes meet.

use crate::notation::Notation;
use crate::statement::Statement;
use crate::subst::rename_variable;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Pick a name derived from `base` that does not occur in `taken`: first
/// `base` itself, then prime marks up to the notation's prime bound (skipped
/// when `base` already ends in a prime mark), then numeric suffixes `base0`,
/// `base1`, ... The result is never a member of `taken`.
pub fn fresh_name(base: &str, taken: &[String], no: &Notation) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }
    let prime = no.prime();
    if !base.ends_with(prime) {
        let already = base.chars().filter(|c| *c == prime).count();
        let mut candidate = base.to_string();
        for _ in already..no.prime_bound() {
            candidate.push(prime);
            if !taken.iter().any(|t| *t == candidate) {
                return candidate;
            }
        }
    }
    let mut n = 0usize;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken.iter().any(|t| *t == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Make later statements compatible with earlier ones: any variable of a
/// later statement that already occurs in an earlier one is renamed fresh,
/// unless it is a context variable (shared on purpose). The first statement
/// is returned untouched.
pub fn resolve(statements: &[Statement], context: &[String], no: &Notation) -> Vec<Statement> {
    let mut output: Vec<Statement> = Vec::with_capacity(statements.len());
    for (i, st) in statements.iter().enumerate() {
        if i == 0 {
            output.push(st.clone());
            continue;
        }
        let mut conclusion = st.clone();
        let conclusion_vars = conclusion.variables();
        let mut earlier_vars: Vec<String> = Vec::new();
        for prior in &output {
            earlier_vars.extend(prior.variables());
        }
        for x in &conclusion_vars {
            if earlier_vars.contains(x) && !context.contains(x) {
                let mut taken: Vec<String> = context.to_vec();
                taken.extend(conclusion_vars.iter().cloned());
                taken.extend(earlier_vars.iter().cloned());
                let fresh = fresh_name(x, &taken, no);
                conclusion = rename_variable(&conclusion, x, &fresh);
            }
        }
        output.push(conclusion);
    }
    output
}

/// Rename top level variables of `statement` that are reserved by enclosing
/// lines but not part of the current context, so a new line cannot capture a
/// name that is already in use around it.
pub fn revise_for_scope(
    context: &[String],
    reserved: &[String],
    statement: &Statement,
    no: &Notation,
) -> Statement {
    let own_context = statement.context();
    let own_vars = statement.variables();
    let mut out = statement.clone();
    for x in &own_context {
        if reserved.contains(x) && !context.contains(x) {
            let mut taken: Vec<String> = reserved.to_vec();
            taken.extend(own_vars.iter().cloned());
            out = rename_variable(&out, x, &fresh_name(x, &taken, no));
        }
    }
    out
}
