// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Components B and C: classifies masked SQL text by statement kind and
//! recursively builds the [`crate::ast`] tree from it.

mod classify;
mod dml;
mod predicate;
mod select;
mod value;

use crate::ast::Statement;
use crate::error::ParseError;
use crate::mask::{mask, Masker};

/// Parses raw SQL text into a [`Statement`]. See [`crate::unmarshal`].
pub fn unmarshal(sql: &str) -> Result<Statement, ParseError> {
    let (masked, masker) = mask(sql)?;
    let kind = classify::statement_keyword(&masked, &masker)?;
    log::debug!("parsed statement type {kind}");
    match kind.as_str() {
        "SELECT" => Ok(Statement::Select(select::parse_select(&masked, &masker)?)),
        "INSERT" => Ok(Statement::Insert(dml::parse_insert(&masked, &masker)?)),
        "UPDATE" => Ok(Statement::Update(dml::parse_update(&masked, &masker)?)),
        "DELETE" => Ok(Statement::Delete(dml::parse_delete(&masked, &masker)?)),
        other => Err(ParseError::UnknownStatementType(other.to_string())),
    }
}

/// Strips a single matching outer `l`/`r` wrapping from `s`, only when the
/// leftmost `l` is at the very start and the rightmost `r` is at the very
/// end. Mirrors the original implementation's `trimLR`: a partial or
/// mismatched wrapping is left untouched.
pub(crate) fn trim_lr<'a>(s: &'a str, l: &str, r: &str) -> &'a str {
    if s.is_empty() {
        return s;
    }
    let Some(left) = s.find(l) else { return s };
    let Some(right) = s.rfind(r) else { return s };
    if left == 0 && right == s.len() - r.len() {
        &s[left + l.len()..right]
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_lr_strips_matching_wrap_only() {
        assert_eq!(trim_lr("(A=1)", "(", ")"), "A=1");
        assert_eq!(trim_lr("(A=1)B", "(", ")"), "(A=1)B");
        assert_eq!(trim_lr("A=1", "(", ")"), "A=1");
    }
}
