// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `INSERT`, `UPDATE` and `DELETE` statement nodes.

use super::{EquationList, Select, Value};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Insert {
    pub table: String,
    pub fields: Vec<String>,
    pub values: InsertValues,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum InsertValues {
    List(Vec<Value>),
    Select(Box<Select>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<UpdateAssignment>,
    pub r#where: EquationList,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UpdateAssignment {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Delete {
    pub table: String,
    pub r#where: EquationList,
}
