// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `SELECT` statement nodes, including set-operator combined statements and
//! join chains.

use super::{EquationList, Function, Value};

/// One or more [`SelectItem`]s joined by a set operator (`UNION`, `UNION
/// ALL`, `MINUS`, `INTERSECT`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Select {
    pub items: Vec<SelectItem>,
}

/// A single `SELECT ... FROM ...` arm.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SelectItem {
    pub fields: Vec<SelectField>,
    pub tables: Vec<SelectTable>,
    pub r#where: EquationList,
    pub group_by: Vec<Value>,
    pub having: EquationList,
    pub order: Option<OrderClause>,
    /// The set operator joining this arm to the previous one; empty for the
    /// first arm. One of "UNION", "UNION ALL", "MINUS", "INTERSECT".
    pub aggregate: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SelectField {
    pub value: Value,
    pub alias: Option<String>,
}

/// A table reference, optionally the start of a join chain.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SelectTable {
    pub table: TableRef,
    pub alias: Option<String>,
    /// Present when this element is joined to the previous one: "JOIN",
    /// "LEFT JOIN", "RIGHT JOIN" or "INNER JOIN".
    pub join_kind: Option<String>,
    pub join_on: EquationList,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TableRef {
    Ident(String),
    Subquery(Box<Select>),
    /// A join chain: the first element carries no `join_kind`.
    Join(Vec<SelectTable>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OrderClause {
    By(OrderBy),
    /// The `ORDER DECODE(...)` form.
    Decode(Function),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderBy {
    pub values: Vec<Value>,
    /// "ASC" or "DESC".
    pub collation: String,
}
