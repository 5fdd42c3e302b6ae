// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Error types for masking, parsing and serializing SQL statements.

/// Errors raised while masking string literals, quoted identifiers,
/// parameters and parenthesized groups out of raw SQL text.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum MaskError {
    #[error("unbalanced parentheses: missing '('")]
    MissingLeftParen,
    #[error("unbalanced parentheses: missing ')'")]
    MissingRightParen,
    #[error("no such placeholder: {0}")]
    PlaceholderNotFound(String),
}

/// Errors raised while building an AST out of masked SQL text.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error("unknown statement type: {0}")]
    UnknownStatementType(String),
    #[error("missing SELECT fields")]
    MissingFields,
    #[error("missing FROM table list")]
    MissingTable,
    #[error("missing VALUES or SELECT in INSERT statement")]
    MissingValues,
    #[error("missing SET clause in UPDATE statement")]
    MissingSet,
    #[error("missing END in CASE expression")]
    MissingEnd,
    #[error("BETWEEN without a matching AND")]
    BetweenMissingAnd,
    #[error("comparison predicate does not have exactly two operands: {0}")]
    MissingComparisonOperand(String),
    #[error("malformed assignment in UPDATE SET clause: {0}")]
    UpdateAssignmentShape(String),
    #[error("could not parse value: {0}")]
    UnparseableValue(String),
    #[error("table clause has more than two space-separated parts: {0}")]
    TableClauseShape(String),
}

/// Errors raised while rendering an AST back to SQL text.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum SerializeError {
    #[error("invalid comparison operator: {0}")]
    InvalidComparisonOperator(String),
    #[error("invalid predicate operator: {0}")]
    InvalidOtherOperator(String),
    #[error("invalid join keyword: {0}")]
    InvalidJoinKeyword(String),
    #[error("parameter name is empty")]
    EmptyParameterName,
    #[error("parameter name does not start with ':': {0}")]
    ParameterMissingColon(String),
    #[error("missing SELECT fields")]
    MissingFields,
    #[error("missing FROM table list")]
    MissingTable,
    #[error("missing assignments in UPDATE SET clause")]
    MissingAssignments,
    #[error("CASE expression has no WHEN arm")]
    MissingWhenArm,
    #[error("ORDER BY has no values")]
    EmptyOrderByList,
    #[error("value cannot be serialized: {0}")]
    UnencodableValue(String),
}
