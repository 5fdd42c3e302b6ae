// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component C.4/C.5: parses a single [`Value`] -- literals, parameters,
//! function calls, arithmetic, concatenation, subqueries and `CASE WHEN`.

use super::{classify, select, trim_lr};
use crate::ast::{CaseWhen, CaseWhenArm, Equation, EquationBody, EquationList, Function, Number, NumberTerm, Parameter, Value};
use crate::error::ParseError;
use crate::mask::{Masker, PlaceholderKind};

lazy_static::lazy_static! {
    static ref ARITH_OP: regex::Regex = regex::Regex::new(r"[+\-*/]").unwrap();
    static ref CASE_KEYWORD: regex::Regex = regex::Regex::new(r"\bCASE\b|\bWHEN\b|\bTHEN\b|\bELSE\b|\bEND\b").unwrap();
}

pub fn get_value(s: &str, masker: &Masker) -> Result<Value, ParseError> {
    let s = s.trim();

    if !s.starts_with("SELECT ") {
        let parts: Vec<&str> = s.split("||").collect();
        if parts.len() > 1 {
            let mut items = Vec::with_capacity(parts.len());
            for part in parts {
                items.push(get_value(part.trim(), masker)?);
            }
            return Ok(Value::Concatenation(items));
        }
    }

    if let Some(terms) = split_arithmetic(s)? {
        if terms.len() > 1 {
            let mut number_terms = Vec::with_capacity(terms.len());
            for (value_text, operator) in terms {
                number_terms.push(NumberTerm {
                    value: get_value(value_text.trim(), masker)?,
                    operator,
                });
            }
            return Ok(Value::Number(Number { terms: number_terms }));
        }
    }

    let tokens: Vec<&str> = s.split_whitespace().collect();
    match tokens.len() {
        0 => Err(ParseError::UnparseableValue(s.to_string())),
        1 => get_single_token_value(tokens[0], masker),
        2 => Ok(Value::Function(get_function(tokens[0], tokens[1], masker)?)),
        _ if tokens[0] == "CASE" => Ok(Value::CaseWhen(parse_case_when(s, masker)?)),
        _ if tokens[0] == "SELECT" => Ok(Value::Subquery(Box::new(select::parse_select(s, masker)?))),
        _ => Err(ParseError::UnparseableValue(s.to_string())),
    }
}

fn get_single_token_value(token: &str, masker: &Masker) -> Result<Value, ParseError> {
    if !token.starts_with('$') {
        return Ok(Value::Ident(token.to_string()));
    }
    let (unwrapped, placeholders) = masker.unmask_once(token)?;
    match placeholders.len() {
        0 => Ok(Value::Ident(token.to_string())),
        1 => match placeholders[0].kind {
            PlaceholderKind::Parameter => Ok(Value::Parameter(Parameter::new(unwrapped))),
            PlaceholderKind::StringLit | PlaceholderKind::QuotedIdent | PlaceholderKind::Backtick => {
                Ok(Value::Ident(unwrapped))
            }
            PlaceholderKind::Group => {
                let inner = trim_lr(&placeholders[0].text, "(", ")");
                let keyword = classify::statement_keyword(inner, masker)?;
                if keyword == "SELECT" {
                    Ok(Value::Subquery(Box::new(select::parse_select(inner, masker)?)))
                } else {
                    get_value(inner, masker)
                }
            }
        },
        _ => Err(ParseError::UnparseableValue(token.to_string())),
    }
}

fn get_function(name: &str, params: &str, masker: &Masker) -> Result<Function, ParseError> {
    let (name, _) = masker.unmask_once(name)?;
    let (params, _) = masker.unmask_once(params)?;
    let params = params.trim().trim_start_matches('(').trim_end_matches(')').trim();
    let mut values = Vec::new();
    if !params.is_empty() {
        for item in params.split(',') {
            values.push(get_value(item.trim(), masker)?);
        }
    }
    Ok(Function { name, params: values })
}

/// Splits `s` on `+ - * /`, matching the constraints on a lone `*`: it is
/// not treated as multiplication when it touches `.` (e.g. `T.*`) or when
/// either side of it is empty.
fn split_arithmetic(s: &str) -> Result<Option<Vec<(String, String)>>, ParseError> {
    let matches: Vec<&str> = ARITH_OP.find_iter(s).map(|m| m.as_str()).collect();
    if matches.is_empty() {
        return Ok(None);
    }
    let parts: Vec<&str> = split_by_regex(s, &ARITH_OP);
    if matches.len() == 1 && matches[0] == "*" {
        if s.contains(".*") || parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Ok(None);
        }
    }
    let mut terms = Vec::with_capacity(parts.len());
    for (idx, part) in parts.into_iter().enumerate() {
        let operator = if idx == 0 { String::new() } else { matches[idx - 1].to_string() };
        terms.push((part.to_string(), operator));
    }
    Ok(Some(terms))
}

pub(crate) fn split_by_regex<'a>(s: &'a str, re: &regex::Regex) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in re.find_iter(s) {
        parts.push(&s[last..m.start()]);
        last = m.end();
    }
    parts.push(&s[last..]);
    parts
}

fn parse_case_when(s: &str, masker: &Masker) -> Result<CaseWhen, ParseError> {
    let s = s.trim();
    let is_case_when = s.contains("CASE WHEN");
    let keywords: Vec<&str> = CASE_KEYWORD.find_iter(s).map(|m| m.as_str()).collect();
    let segments: Vec<String> = CASE_KEYWORD
        .split(s)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let mut case_value: Option<Value> = None;
    let mut condition: Option<EquationList> = None;
    let mut arms = Vec::new();
    let mut else_value = None;
    let mut saw_end = false;
    let mut idx = 0;

    for keyword in keywords {
        match keyword {
            "CASE" if !is_case_when => {
                case_value = Some(get_value(&segments[idx], masker)?);
                idx += 1;
            }
            "CASE" => {}
            "WHEN" if !is_case_when => {
                let left = case_value
                    .clone()
                    .ok_or_else(|| ParseError::UnparseableValue(s.to_string()))?;
                let right = get_value(&segments[idx], masker)?;
                idx += 1;
                condition = Some(EquationList {
                    items: vec![Equation {
                        body: EquationBody::Normal { left, op: "=".to_string(), right },
                        connector: String::new(),
                    }],
                });
            }
            "WHEN" => {
                condition = Some(super::predicate::parse_equation_list(&segments[idx], masker)?);
                idx += 1;
            }
            "THEN" => {
                let then = get_value(&segments[idx], masker)?;
                idx += 1;
                let condition = condition
                    .take()
                    .ok_or_else(|| ParseError::UnparseableValue(s.to_string()))?;
                arms.push(CaseWhenArm { condition, then });
            }
            "ELSE" => {
                else_value = Some(Box::new(get_value(&segments[idx], masker)?));
                idx += 1;
            }
            "END" => saw_end = true,
            other => return Err(ParseError::UnparseableValue(other.to_string())),
        }
    }
    if !saw_end {
        return Err(ParseError::MissingEnd);
    }
    Ok(CaseWhen { arms, r#else: else_value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::mask;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_plain_identifier() {
        let (masked, masker) = mask("SYSDATE").unwrap();
        assert_eq!(get_value(&masked, &masker).unwrap(), Value::Ident("SYSDATE".to_string()));
    }

    #[test]
    fn parses_number_expression() {
        let (masked, masker) = mask("A+B").unwrap();
        match get_value(&masked, &masker).unwrap() {
            Value::Number(n) => assert_eq!(n.terms.len(), 2),
            other => panic!("expected Number, got {other:?}"),
        }
    }

    #[test]
    fn star_after_dot_is_not_arithmetic() {
        let (masked, masker) = mask("T.*").unwrap();
        assert_eq!(get_value(&masked, &masker).unwrap(), Value::Ident("T.*".to_string()));
    }

    #[test]
    fn parses_concatenation() {
        let (masked, masker) = mask("'A'||'B'").unwrap();
        match get_value(&masked, &masker).unwrap() {
            Value::Concatenation(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Concatenation, got {other:?}"),
        }
    }
}
