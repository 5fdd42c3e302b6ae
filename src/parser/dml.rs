// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component C.8: parses masked `INSERT`, `UPDATE` and `DELETE` statements.

use super::{predicate, select, trim_lr, value};
use crate::ast::{Delete, Insert, InsertValues, Update, UpdateAssignment};
use crate::error::ParseError;
use crate::mask::{Masker, PlaceholderKind};

pub fn parse_insert(s: &str, masker: &Masker) -> Result<Insert, ParseError> {
    let rest = s
        .trim()
        .strip_prefix("INSERT")
        .and_then(|r| r.trim().strip_prefix("INTO"))
        .ok_or(ParseError::MissingTable)?
        .trim();

    let (head, values_kind, values_tail) = split_on_keyword(rest, "VALUES")
        .map(|(h, t)| (h, "VALUES", t))
        .or_else(|| split_on_keyword(rest, "SELECT").map(|(h, t)| (h, "SELECT", t)))
        .ok_or(ParseError::MissingValues)?;

    let head_tokens: Vec<&str> = head.trim().split_whitespace().collect();
    let (table_text, fields) = match head_tokens.as_slice() {
        [table] => (table.to_string(), Vec::new()),
        [table, fields_token] => {
            let ph = masker
                .as_single_placeholder(fields_token)
                .filter(|ph| ph.kind == PlaceholderKind::Group)
                .ok_or_else(|| ParseError::UnparseableValue(fields_token.to_string()))?;
            let inner = trim_lr(ph.text.trim(), "(", ")");
            (table.to_string(), select::split_top_level_commas(inner))
        }
        _ => return Err(ParseError::MissingTable),
    };

    let values = match values_kind {
        "VALUES" => {
            let tail = values_tail.trim();
            let ph = masker
                .as_single_placeholder(tail)
                .ok_or_else(|| ParseError::UnparseableValue(tail.to_string()))?;
            let inner = trim_lr(ph.text.trim(), "(", ")");
            let items = select::split_top_level_commas(inner)
                .into_iter()
                .map(|item| value::get_value(item.trim(), masker))
                .collect::<Result<Vec<_>, _>>()?;
            InsertValues::List(items)
        }
        _ => InsertValues::Select(Box::new(select::parse_select(&format!("SELECT {values_tail}"), masker)?)),
    };

    Ok(Insert { table: table_text, fields, values })
}

pub fn parse_update(s: &str, masker: &Masker) -> Result<Update, ParseError> {
    let rest = s.trim().strip_prefix("UPDATE").ok_or(ParseError::MissingTable)?.trim();
    let (before_where, where_text) = split_on_keyword(rest, "WHERE").map(|(h, t)| (h, Some(t))).unwrap_or((rest.to_string(), None));
    let (table_text, set_text) = split_on_keyword(&before_where, "SET").ok_or(ParseError::MissingSet)?;

    let assignments = select::split_top_level_commas(&set_text)
        .into_iter()
        .map(|item| parse_assignment(&item, masker))
        .collect::<Result<Vec<_>, _>>()?;

    let r#where = match where_text {
        Some(t) => predicate::parse_equation_list(t.trim(), masker)?,
        None => Default::default(),
    };

    Ok(Update { table: table_text.trim().to_string(), assignments, r#where })
}

fn parse_assignment(s: &str, masker: &Masker) -> Result<UpdateAssignment, ParseError> {
    let parts: Vec<&str> = s.split('=').collect();
    let [field, value_text] = parts.as_slice() else {
        return Err(ParseError::UpdateAssignmentShape(s.to_string()));
    };
    Ok(UpdateAssignment {
        field: field.trim().to_string(),
        value: value::get_value(value_text.trim(), masker)?,
    })
}

pub fn parse_delete(s: &str, masker: &Masker) -> Result<Delete, ParseError> {
    let rest = s
        .trim()
        .strip_prefix("DELETE")
        .map(|r| r.trim().strip_prefix("FROM").unwrap_or(r.trim()))
        .ok_or(ParseError::MissingTable)?
        .trim();
    let (table_text, where_text) = split_on_keyword(rest, "WHERE").map(|(h, t)| (h, Some(t))).unwrap_or((rest.to_string(), None));

    let r#where = match where_text {
        Some(t) => predicate::parse_equation_list(t.trim(), masker)?,
        None => Default::default(),
    };

    Ok(Delete { table: table_text.trim().to_string(), r#where })
}

/// Splits `s` at the first top-level occurrence of `keyword`, returning
/// `None` when the keyword is absent.
fn split_on_keyword(s: &str, keyword: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let pos = tokens.iter().position(|t| *t == keyword)?;
    Some((tokens[..pos].join(" "), tokens[pos + 1..].join(" ")))
}
