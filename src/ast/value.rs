// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Value and predicate nodes shared by every statement kind.

use super::Select;

/// A bind parameter such as `:id` or a bare `:` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The universal expression node. Appears as a select field, a predicate
/// operand, a function argument, an `INSERT`/`UPDATE` value, and so on.
///
/// Invariant: a [`Value::Concatenation`] never contains another
/// [`Value::Concatenation`] directly (flattened at parse time). A
/// [`Value::Number`] never has exactly one term (unwrapped at parse time).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// An unquoted identifier, keyword-like reference (`SYSDATE`), or a
    /// quoted literal with its surrounding quotes still attached.
    Ident(String),
    Parameter(Parameter),
    Subquery(Box<Select>),
    Function(Function),
    CaseWhen(CaseWhen),
    Number(Number),
    Concatenation(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaseWhen {
    pub arms: Vec<CaseWhenArm>,
    pub r#else: Option<Box<Value>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaseWhenArm {
    pub condition: EquationList,
    pub then: Value,
}

/// An arithmetic expression `a + b - c`. The first term's operator is empty.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Number {
    pub terms: Vec<NumberTerm>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NumberTerm {
    pub value: Value,
    /// "" for the first term, else one of "+", "-", "*", "/".
    pub operator: String,
}

/// A list of predicates joined by `AND`/`OR`. The first item's connector is
/// always empty.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct EquationList {
    pub items: Vec<Equation>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Equation {
    pub body: EquationBody,
    /// "" for the first item in its list, else "AND" or "OR".
    pub connector: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EquationBody {
    /// `left op right` where op is one of `< <= > >= = != <>`.
    Normal { left: Value, op: String, right: Value },
    /// `left IS NULL`, `left LIKE right`, `left IN (right...)`, etc. See
    /// invariant E1 for which operators require which shape of `right`.
    Other { left: Value, op: String, right: Vec<Value> },
    Between(Between),
    /// A parenthesized sub-group of predicates.
    Nested(EquationList),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Between {
    pub field: Value,
    pub low: Value,
    pub high: Value,
}
