// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component C.6: parses a masked predicate clause (the body of a `WHERE`,
//! `HAVING` or `ON`) into an [`EquationList`].

use super::trim_lr;
use crate::ast::{Between, Equation, EquationBody, EquationList, Value};
use crate::error::ParseError;
use crate::mask::{Masker, PlaceholderKind};

lazy_static::lazy_static! {
    // Matches one comparison character at a time, not a compound operator.
    // A two-character operator (`>=`, `<=`, `!=`, `<>`) therefore produces
    // two adjacent matches, which splits the segment into three parts
    // instead of two and is rejected by the operand-count check below --
    // this dialect's comparison predicates only ever parse as one of the
    // single-character operators `<`, `>`, `=`. See SPEC_FULL.md §9.
    static ref COMPARISON: regex::Regex = regex::Regex::new(r"[<>=!]").unwrap();
    static ref IS_NOT_NULL: regex::Regex = regex::Regex::new(r"\bIS\s+NOT\s+NULL\b").unwrap();
    static ref IS_NULL: regex::Regex = regex::Regex::new(r"\bIS\s+NULL\b").unwrap();
    static ref NOT_IN: regex::Regex = regex::Regex::new(r"\bNOT\s+IN\b").unwrap();
    static ref IN_OP: regex::Regex = regex::Regex::new(r"\bIN\b").unwrap();
    static ref NOT_LIKE: regex::Regex = regex::Regex::new(r"\bNOT\s+LIKE\b").unwrap();
    static ref LIKE_OP: regex::Regex = regex::Regex::new(r"\bLIKE\b").unwrap();
    static ref NOT_EXIST: regex::Regex = regex::Regex::new(r"\bNOT\s+EXIST\b").unwrap();
    static ref EXIST_OP: regex::Regex = regex::Regex::new(r"\bEXIST\b").unwrap();
}

pub fn parse_equation_list(s: &str, masker: &Masker) -> Result<EquationList, ParseError> {
    let (segments, connectors) = split_by_connector(s);
    let mut items = Vec::with_capacity(segments.len());
    for (idx, segment) in segments.iter().enumerate() {
        let connector = if idx == 0 { String::new() } else { connectors[idx - 1].clone() };
        let body = parse_equation_body(segment.trim(), masker)?;
        items.push(Equation { body, connector });
    }
    Ok(EquationList { items })
}

/// Splits `s` on top-level `AND`/`OR` tokens, treating the `AND` that closes
/// a `BETWEEN ... AND ...` span as part of the `BETWEEN` segment rather than
/// a connector.
fn split_by_connector(s: &str) -> (Vec<String>, Vec<String>) {
    let mut segments = Vec::new();
    let mut connectors = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut between_pending = false;

    for token in s.split_whitespace() {
        match token {
            "BETWEEN" => {
                between_pending = true;
                current.push(token);
            }
            "AND" if between_pending => {
                between_pending = false;
                current.push(token);
            }
            "AND" | "OR" => {
                segments.push(current.join(" "));
                current.clear();
                connectors.push(token.to_string());
            }
            _ => current.push(token),
        }
    }
    segments.push(current.join(" "));
    (segments, connectors)
}

fn parse_equation_body(segment: &str, masker: &Masker) -> Result<EquationBody, ParseError> {
    if let Some(ph) = masker.as_single_placeholder(segment) {
        if ph.kind == PlaceholderKind::Group {
            let inner = trim_lr(ph.text.trim(), "(", ")");
            return Ok(EquationBody::Nested(parse_equation_list(inner, masker)?));
        }
    }

    if segment.split_whitespace().any(|t| t == "BETWEEN") {
        return parse_between(segment, masker);
    }

    let comparison_chars: Vec<&str> = COMPARISON.find_iter(segment).map(|m| m.as_str()).collect();
    if !comparison_chars.is_empty() {
        let parts = super::value::split_by_regex(segment, &COMPARISON);
        if parts.len() != 2 {
            return Err(ParseError::MissingComparisonOperand(segment.to_string()));
        }
        let left = parts[0].trim();
        let right = parts[1].trim();
        if left.is_empty() || right.is_empty() {
            return Err(ParseError::MissingComparisonOperand(segment.to_string()));
        }
        return Ok(EquationBody::Normal {
            left: super::value::get_value(left, masker)?,
            op: comparison_chars.concat(),
            right: super::value::get_value(right, masker)?,
        });
    }

    parse_other(segment, masker)
}

fn parse_between(segment: &str, masker: &Masker) -> Result<EquationBody, ParseError> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let between_pos = tokens
        .iter()
        .position(|t| *t == "BETWEEN")
        .ok_or_else(|| ParseError::UnparseableValue(segment.to_string()))?;
    let and_pos = tokens[between_pos + 1..]
        .iter()
        .position(|t| *t == "AND")
        .map(|p| p + between_pos + 1)
        .ok_or(ParseError::BetweenMissingAnd)?;

    let field = tokens[..between_pos].join(" ");
    let low = tokens[between_pos + 1..and_pos].join(" ");
    let high = tokens[and_pos + 1..].join(" ");

    Ok(EquationBody::Between(Between {
        field: super::value::get_value(&field, masker)?,
        low: super::value::get_value(&low, masker)?,
        high: super::value::get_value(&high, masker)?,
    }))
}

fn parse_other(segment: &str, masker: &Masker) -> Result<EquationBody, ParseError> {
    if let Some(m) = IS_NOT_NULL.find(segment) {
        return other(segment, &m, "IS NOT NULL", Vec::new(), masker);
    }
    if let Some(m) = IS_NULL.find(segment) {
        return other(segment, &m, "IS NULL", Vec::new(), masker);
    }
    if let Some(m) = NOT_IN.find(segment) {
        let right = parse_list_operand(&segment[m.end()..], masker)?;
        return other(segment, &m, "NOT IN", right, masker);
    }
    if let Some(m) = IN_OP.find(segment) {
        let right = parse_list_operand(&segment[m.end()..], masker)?;
        return other(segment, &m, "IN", right, masker);
    }
    if let Some(m) = NOT_LIKE.find(segment) {
        let right = vec![super::value::get_value(segment[m.end()..].trim(), masker)?];
        return other(segment, &m, "NOT LIKE", right, masker);
    }
    if let Some(m) = LIKE_OP.find(segment) {
        let right = vec![super::value::get_value(segment[m.end()..].trim(), masker)?];
        return other(segment, &m, "LIKE", right, masker);
    }
    if let Some(m) = NOT_EXIST.find(segment) {
        let right = parse_list_operand(&segment[m.end()..], masker)?;
        return exist(segment, &m, "NOT EXIST", right, masker);
    }
    if let Some(m) = EXIST_OP.find(segment) {
        let right = parse_list_operand(&segment[m.end()..], masker)?;
        return exist(segment, &m, "EXIST", right, masker);
    }
    Err(ParseError::UnparseableValue(segment.to_string()))
}

fn other(
    segment: &str,
    m: &regex::Match,
    op: &str,
    right: Vec<Value>,
    masker: &Masker,
) -> Result<EquationBody, ParseError> {
    let left = segment[..m.start()].trim();
    if left.is_empty() {
        return Err(ParseError::MissingComparisonOperand(segment.to_string()));
    }
    Ok(EquationBody::Other { left: super::value::get_value(left, masker)?, op: op.to_string(), right })
}

/// `EXIST`/`NOT EXIST` has no left operand in ordinary usage (`EXIST
/// (SELECT ...)`); unlike every other `Other` keyword, an empty left side is
/// not an error here.
fn exist(
    segment: &str,
    m: &regex::Match,
    op: &str,
    right: Vec<Value>,
    masker: &Masker,
) -> Result<EquationBody, ParseError> {
    let left = segment[..m.start()].trim();
    let left = if left.is_empty() { Value::Ident(String::new()) } else { super::value::get_value(left, masker)? };
    Ok(EquationBody::Other { left, op: op.to_string(), right })
}

fn parse_list_operand(s: &str, masker: &Masker) -> Result<Vec<Value>, ParseError> {
    let s = s.trim();
    if let Some(ph) = masker.as_single_placeholder(s) {
        if ph.kind == PlaceholderKind::Group {
            let inner = trim_lr(ph.text.trim(), "(", ")");
            let mut values = Vec::new();
            for item in inner.split(',') {
                values.push(super::value::get_value(item.trim(), masker)?);
            }
            return Ok(values);
        }
    }
    Ok(vec![super::value::get_value(s, masker)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::mask;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_simple_comparison() {
        let (masked, masker) = mask("A = 1").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        assert_eq!(list.items.len(), 1);
        match &list.items[0].body {
            EquationBody::Normal { op, .. } => assert_eq!(op, "="),
            other => panic!("expected Normal, got {other:?}"),
        }
    }

    #[test]
    fn two_character_comparison_operator_fails_to_parse() {
        // `>=` matches the single-character class twice, splitting the
        // segment into three parts instead of two -- this dialect's
        // comparison predicates only ever parse as `<`, `>` or `=`.
        let (masked, masker) = mask("A >= 1").unwrap();
        assert!(parse_equation_list(&masked, &masker).is_err());
    }

    #[test]
    fn between_and_is_not_a_connector() {
        let (masked, masker) = mask("A BETWEEN 1 AND 10").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(matches!(list.items[0].body, EquationBody::Between(_)));
    }

    #[test]
    fn and_inside_identifier_is_not_mistaken_for_between_close() {
        let (masked, masker) = mask("GRAND_TOTAL = 1 AND B = 2").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].connector, "AND");
    }

    #[test]
    fn nested_group_round_trips_without_double_parens() {
        let (masked, masker) = mask("(A = 1 AND B = 2)").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        assert_eq!(list.items.len(), 1);
        match &list.items[0].body {
            EquationBody::Nested(inner) => assert_eq!(inner.items.len(), 2),
            other => panic!("expected Nested, got {other:?}"),
        }
    }

    #[test]
    fn parses_in_list() {
        let (masked, masker) = mask("A IN (1, 2, 3)").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        match &list.items[0].body {
            EquationBody::Other { op, right, .. } => {
                assert_eq!(op, "IN");
                assert_eq!(right.len(), 3);
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn parses_is_null() {
        let (masked, masker) = mask("A IS NULL").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        match &list.items[0].body {
            EquationBody::Other { op, right, .. } => {
                assert_eq!(op, "IS NULL");
                assert!(right.is_empty());
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn parses_exist_with_no_left_operand() {
        let (masked, masker) = mask("EXIST (SELECT 1 FROM DUAL)").unwrap();
        let list = parse_equation_list(&masked, &masker).unwrap();
        match &list.items[0].body {
            EquationBody::Other { op, left, right } => {
                assert_eq!(op, "EXIST");
                assert_eq!(left, &Value::Ident(String::new()));
                assert_eq!(right.len(), 1);
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn exists_keyword_with_trailing_s_is_not_recognized() {
        // The dialect's quirk: the parser matches the literal token `EXIST`,
        // not `EXISTS`, so `A.ID IN (SELECT ...)` style real-world `EXISTS`
        // clauses are deliberately out of scope here -- see SPEC_FULL.md.
        let (masked, masker) = mask("A = 1 AND EXISTS (SELECT 1 FROM DUAL)").unwrap();
        assert!(parse_equation_list(&masked, &masker).is_err());
    }
}
