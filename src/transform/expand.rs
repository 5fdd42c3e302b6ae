// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component E.3: parameter expansion -- fans a single bind parameter out
//! into `count` positionally-suffixed parameters, for the array-binding
//! pattern `WHERE id IN (:ids)` where the caller supplies a variable-length
//! list at execute time.
//!
//! Unlike deletion, expansion never removes structure; it rebuilds the same
//! shape everywhere except inside the handful of `Other` predicates whose
//! operator takes a list: `IN`, `NOT IN`, `EXIST`, `NOT EXIST`. A matching
//! parameter anywhere else (a `LIKE` operand, a plain `SELECT` field, a
//! `Normal` comparison) is left untouched -- see `DESIGN.md` resolution 2
//! for why that is narrower than the Go original this was ported from.

use crate::ast::{
    CaseWhen, CaseWhenArm, Delete, Equation, EquationBody, EquationList, Function, Insert,
    InsertValues, Number, NumberTerm, OrderBy, OrderClause, Parameter, Select, SelectField,
    SelectItem, SelectTable, Statement, TableRef, Update, UpdateAssignment, Value,
};

const EXPANDABLE_OPS: [&str; 4] = ["IN", "NOT IN", "EXIST", "NOT EXIST"];

impl Statement {
    /// Replaces every occurrence of `par` inside an `IN`/`NOT IN`/`EXIST`/
    /// `NOT EXIST` right-hand list with `count` new parameters named
    /// `par.name + "0"`, `par.name + "1"`, ... `par.name + (count - 1)`.
    /// `count <= 0` is a no-op.
    pub fn expand_params(&self, par: &Parameter, count: i64) -> Statement {
        match self {
            Statement::Select(s) => Statement::Select(expand_select(s, par, count)),
            Statement::Insert(i) => Statement::Insert(expand_insert(i, par, count)),
            Statement::Update(u) => Statement::Update(expand_update(u, par, count)),
            Statement::Delete(d) => Statement::Delete(expand_delete(d, par, count)),
        }
    }
}

fn expand_right(right: &[Value], par: &Parameter, count: i64) -> Vec<Value> {
    if count <= 0 {
        return right.iter().map(|v| expand_value(v, par, count)).collect();
    }
    let mut out = Vec::with_capacity(right.len());
    for v in right {
        match v {
            Value::Parameter(p) if p.name == par.name => {
                for i in 0..count {
                    out.push(Value::Parameter(Parameter::new(format!("{}{}", par.name, i))));
                }
            }
            other => out.push(expand_value(other, par, count)),
        }
    }
    out
}

fn expand_value(v: &Value, par: &Parameter, count: i64) -> Value {
    match v {
        Value::Ident(_) | Value::Parameter(_) => v.clone(),
        Value::Subquery(sel) => Value::Subquery(Box::new(expand_select(sel, par, count))),
        Value::Function(f) => Value::Function(expand_function(f, par, count)),
        Value::CaseWhen(c) => Value::CaseWhen(expand_case_when(c, par, count)),
        Value::Number(n) => Value::Number(Number {
            terms: n
                .terms
                .iter()
                .map(|t| NumberTerm { value: expand_value(&t.value, par, count), operator: t.operator.clone() })
                .collect(),
        }),
        Value::Concatenation(items) => {
            Value::Concatenation(items.iter().map(|v| expand_value(v, par, count)).collect())
        }
    }
}

fn expand_function(f: &Function, par: &Parameter, count: i64) -> Function {
    Function { name: f.name.clone(), params: f.params.iter().map(|v| expand_value(v, par, count)).collect() }
}

fn expand_case_when(c: &CaseWhen, par: &Parameter, count: i64) -> CaseWhen {
    CaseWhen {
        arms: c
            .arms
            .iter()
            .map(|arm| CaseWhenArm {
                condition: expand_equation_list(&arm.condition, par, count),
                then: expand_value(&arm.then, par, count),
            })
            .collect(),
        r#else: c.r#else.as_ref().map(|e| Box::new(expand_value(e, par, count))),
    }
}

fn expand_equation(eq: &Equation, par: &Parameter, count: i64) -> Equation {
    let body = match &eq.body {
        EquationBody::Normal { left, op, right } => EquationBody::Normal {
            left: expand_value(left, par, count),
            op: op.clone(),
            right: expand_value(right, par, count),
        },
        EquationBody::Other { left, op, right } => {
            let right = if EXPANDABLE_OPS.contains(&op.as_str()) {
                expand_right(right, par, count)
            } else {
                right.iter().map(|v| expand_value(v, par, count)).collect()
            };
            EquationBody::Other { left: expand_value(left, par, count), op: op.clone(), right }
        }
        EquationBody::Between(b) => EquationBody::Between(crate::ast::Between {
            field: expand_value(&b.field, par, count),
            low: expand_value(&b.low, par, count),
            high: expand_value(&b.high, par, count),
        }),
        EquationBody::Nested(inner) => EquationBody::Nested(expand_equation_list(inner, par, count)),
    };
    Equation { body, connector: eq.connector.clone() }
}

fn expand_equation_list(list: &EquationList, par: &Parameter, count: i64) -> EquationList {
    EquationList { items: list.items.iter().map(|eq| expand_equation(eq, par, count)).collect() }
}

fn expand_select(sel: &Select, par: &Parameter, count: i64) -> Select {
    Select { items: sel.items.iter().map(|item| expand_select_item(item, par, count)).collect() }
}

fn expand_select_item(item: &SelectItem, par: &Parameter, count: i64) -> SelectItem {
    SelectItem {
        fields: item
            .fields
            .iter()
            .map(|f| SelectField { value: expand_value(&f.value, par, count), alias: f.alias.clone() })
            .collect(),
        tables: item.tables.iter().map(|t| expand_select_table(t, par, count)).collect(),
        r#where: expand_equation_list(&item.r#where, par, count),
        group_by: item.group_by.iter().map(|v| expand_value(v, par, count)).collect(),
        having: expand_equation_list(&item.having, par, count),
        order: item.order.as_ref().map(|o| expand_order(o, par, count)),
        aggregate: item.aggregate.clone(),
    }
}

fn expand_order(o: &OrderClause, par: &Parameter, count: i64) -> OrderClause {
    match o {
        OrderClause::By(ob) => OrderClause::By(OrderBy {
            values: ob.values.iter().map(|v| expand_value(v, par, count)).collect(),
            collation: ob.collation.clone(),
        }),
        OrderClause::Decode(f) => OrderClause::Decode(expand_function(f, par, count)),
    }
}

fn expand_select_table(t: &SelectTable, par: &Parameter, count: i64) -> SelectTable {
    SelectTable {
        table: expand_table_ref(&t.table, par, count),
        alias: t.alias.clone(),
        join_kind: t.join_kind.clone(),
        join_on: expand_equation_list(&t.join_on, par, count),
    }
}

fn expand_table_ref(t: &TableRef, par: &Parameter, count: i64) -> TableRef {
    match t {
        TableRef::Ident(s) => TableRef::Ident(s.clone()),
        TableRef::Subquery(sel) => TableRef::Subquery(Box::new(expand_select(sel, par, count))),
        TableRef::Join(chain) => TableRef::Join(chain.iter().map(|t| expand_select_table(t, par, count)).collect()),
    }
}

fn expand_insert(ins: &Insert, par: &Parameter, count: i64) -> Insert {
    let values = match &ins.values {
        InsertValues::List(values) => {
            InsertValues::List(values.iter().map(|v| expand_value(v, par, count)).collect())
        }
        InsertValues::Select(sel) => InsertValues::Select(Box::new(expand_select(sel, par, count))),
    };
    Insert { table: ins.table.clone(), fields: ins.fields.clone(), values }
}

fn expand_update(u: &Update, par: &Parameter, count: i64) -> Update {
    Update {
        table: u.table.clone(),
        assignments: u
            .assignments
            .iter()
            .map(|a| UpdateAssignment { field: a.field.clone(), value: expand_value(&a.value, par, count) })
            .collect(),
        r#where: expand_equation_list(&u.r#where, par, count),
    }
}

fn expand_delete(d: &Delete, par: &Parameter, count: i64) -> Delete {
    Delete { table: d.table.clone(), r#where: expand_equation_list(&d.r#where, par, count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::unmarshal;
    use pretty_assertions::assert_eq;

    #[test]
    fn expands_in_list_parameter() {
        let stmt = unmarshal("SELECT A FROM T WHERE B IN (:ids)").unwrap();
        let expanded = stmt.expand_params(&Parameter::new(":ids"), 3);
        let Statement::Select(sel) = expanded else { panic!("expected select") };
        match &sel.items[0].r#where.items[0].body {
            EquationBody::Other { op, right, .. } => {
                assert_eq!(op, "IN");
                let names: Vec<&str> = right
                    .iter()
                    .map(|v| match v {
                        Value::Parameter(p) => p.name.as_str(),
                        _ => panic!("expected parameter"),
                    })
                    .collect();
                assert_eq!(names, vec![":ids0", ":ids1", ":ids2"]);
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn does_not_expand_like_operand() {
        let stmt = unmarshal("SELECT A FROM T WHERE B LIKE :p").unwrap();
        let expanded = stmt.expand_params(&Parameter::new(":p"), 3);
        assert_eq!(stmt, expanded);
    }

    #[test]
    fn zero_count_is_a_no_op() {
        let stmt = unmarshal("SELECT A FROM T WHERE B IN (:ids)").unwrap();
        let expanded = stmt.expand_params(&Parameter::new(":ids"), 0);
        assert_eq!(stmt, expanded);
    }
}
