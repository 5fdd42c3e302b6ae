// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Statement-kind detection and top-level `SELECT` set-operator splitting.

use super::trim_lr;
use crate::error::ParseError;
use crate::mask::Masker;

lazy_static::lazy_static! {
    static ref SET_OP: regex::Regex =
        regex::Regex::new(r"( UNION ALL )|( UNION )|( MINUS )|( INTERSECT )").unwrap();
}

/// Returns the uppercase keyword that opens `s` (`SELECT`, `INSERT`, ...),
/// unwrapping one layer of whole-statement parenthesization at a time when
/// the text is itself a single placeholder (e.g. `(SELECT ...)`).
pub fn statement_keyword(s: &str, masker: &Masker) -> Result<String, ParseError> {
    let first = s.split(' ').next().unwrap_or("");
    if !first.starts_with('$') {
        return Ok(first.to_string());
    }
    let (unwrapped, _) = masker.unmask_once(s)?;
    let unwrapped = trim_lr(unwrapped.trim(), "(", ")");
    statement_keyword(unwrapped.trim(), masker)
}

/// Splits masked `SELECT` text on top-level set operators. Because nested
/// subqueries are already masked into single placeholders by this point,
/// this split can never land inside one. Returns the statement segments and
/// the separators between them (one fewer than the number of segments).
pub fn split_set_operators(s: &str) -> (Vec<String>, Vec<String>) {
    let mut segments = Vec::new();
    let mut separators = Vec::new();
    let mut last = 0;
    for m in SET_OP.find_iter(s) {
        segments.push(s[last..m.start()].to_string());
        separators.push(m.as_str().trim().to_string());
        last = m.end();
    }
    segments.push(s[last..].to_string());
    (segments, separators)
}
