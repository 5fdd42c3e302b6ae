// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The abstract syntax tree produced by [`crate::unmarshal`] and consumed by
//! [`crate::marshal`] and the transforms in [`crate::transform`].
//!
//! Every node owns its children directly (`Box` where recursive); there are
//! no back-references and no shared syntax tree. Unlike a lossless CST, this
//! tree discards the original SQL text -- [`crate::marshal`] rebuilds it
//! from structure alone.

mod dml;
mod select;
mod value;

pub use dml::{Delete, Insert, InsertValues, Update, UpdateAssignment};
pub use select::{OrderBy, OrderClause, Select, SelectField, SelectItem, SelectTable, TableRef};
pub use value::{
    Between, CaseWhen, CaseWhenArm, Equation, EquationBody, EquationList, Function, Number,
    NumberTerm, Parameter, Value,
};

/// The four statement kinds this dialect understands.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    /// The uppercase keyword that introduced this statement.
    pub fn r#type(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
        }
    }
}
