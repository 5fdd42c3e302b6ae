// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! A round-trippable parser, serializer and parameter-list transformer for
//! an Oracle-flavored SQL dialect.
//!
//! [`unmarshal`] turns raw SQL text into a [`Statement`] tree; [`marshal`]
//! renders it back to SQL. The two are structural inverses, not a
//! byte-for-byte one: a `CASE v WHEN a THEN ...` short form reparses to the
//! same tree as the long `CASE WHEN v = a THEN ...` form, and `marshal`
//! always emits the long form.
//!
//! [`Statement::params`], [`Statement::delete_params`] and
//! [`Statement::expand_params`] walk that tree to enumerate, prune and fan
//! out bind parameters without ever touching SQL text directly.

mod ast;
mod error;
mod mask;
mod parser;
mod serialize;
mod transform;

pub use ast::{
    Between, CaseWhen, CaseWhenArm, Delete, Equation, EquationBody, EquationList, Function,
    Insert, InsertValues, Number, NumberTerm, OrderBy, OrderClause, Parameter, Select, SelectField,
    SelectItem, SelectTable, Statement, TableRef, Update, UpdateAssignment, Value,
};
pub use error::{MaskError, ParseError, SerializeError};
pub use parser::unmarshal;
pub use serialize::marshal;
pub use transform::{find_params_by_string, remove_duplicate_params};
