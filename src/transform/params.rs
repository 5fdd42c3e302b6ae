// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component E.1: parameter enumeration.

use crate::ast::{
    CaseWhen, Delete, Equation, EquationBody, EquationList, Function, Insert, InsertValues,
    Number, OrderClause, Parameter, Select, SelectItem, SelectTable, Statement, TableRef, Update,
    Value,
};

impl Statement {
    /// Every [`Parameter`] reachable from this statement, in left-to-right
    /// encounter order. Duplicates (the same bind name used twice) are kept;
    /// call [`remove_duplicate_params`] to collapse them.
    pub fn params(&self) -> Vec<Parameter> {
        let mut out = Vec::new();
        match self {
            Statement::Select(s) => collect_select(s, &mut out),
            Statement::Insert(i) => collect_insert(i, &mut out),
            Statement::Update(u) => collect_update(u, &mut out),
            Statement::Delete(d) => collect_delete(d, &mut out),
        }
        out
    }
}

/// Deduplicates `pars` by [`Parameter::name`], keeping each name's first
/// occurrence and discarding later repeats.
pub fn remove_duplicate_params(pars: Vec<Parameter>) -> Vec<Parameter> {
    let mut seen = std::collections::HashSet::new();
    pars.into_iter().filter(|p| seen.insert(p.name.clone())).collect()
}

/// A pure-text sibling of [`Statement::params`]: masks strings/quoted
/// identifiers in `sql` and returns every `:\w*` token found, in source
/// order, without building an AST.
pub fn find_params_by_string(sql: &str) -> Vec<Parameter> {
    crate::mask::find_params_by_string(sql).into_iter().map(Parameter::new).collect()
}

fn collect_select(sel: &Select, out: &mut Vec<Parameter>) {
    for item in &sel.items {
        collect_select_item(item, out);
    }
}

fn collect_select_item(item: &SelectItem, out: &mut Vec<Parameter>) {
    for field in &item.fields {
        collect_value(&field.value, out);
    }
    for table in &item.tables {
        collect_select_table(table, out);
    }
    collect_equation_list(&item.r#where, out);
    for v in &item.group_by {
        collect_value(v, out);
    }
    collect_equation_list(&item.having, out);
    if let Some(order) = &item.order {
        match order {
            OrderClause::By(o) => {
                for v in &o.values {
                    collect_value(v, out);
                }
            }
            OrderClause::Decode(f) => collect_function(f, out),
        }
    }
}

fn collect_select_table(table: &SelectTable, out: &mut Vec<Parameter>) {
    collect_table_ref(&table.table, out);
    collect_equation_list(&table.join_on, out);
}

fn collect_table_ref(table: &TableRef, out: &mut Vec<Parameter>) {
    match table {
        TableRef::Ident(_) => {}
        TableRef::Subquery(sel) => collect_select(sel, out),
        TableRef::Join(chain) => {
            for t in chain {
                collect_select_table(t, out);
            }
        }
    }
}

fn collect_insert(ins: &Insert, out: &mut Vec<Parameter>) {
    match &ins.values {
        InsertValues::List(values) => {
            for v in values {
                collect_value(v, out);
            }
        }
        InsertValues::Select(sel) => collect_select(sel, out),
    }
}

fn collect_update(u: &Update, out: &mut Vec<Parameter>) {
    for a in &u.assignments {
        collect_value(&a.value, out);
    }
    collect_equation_list(&u.r#where, out);
}

fn collect_delete(d: &Delete, out: &mut Vec<Parameter>) {
    collect_equation_list(&d.r#where, out);
}

fn collect_equation_list(list: &EquationList, out: &mut Vec<Parameter>) {
    for item in &list.items {
        collect_equation(item, out);
    }
}

fn collect_equation(eq: &Equation, out: &mut Vec<Parameter>) {
    match &eq.body {
        EquationBody::Normal { left, right, .. } => {
            collect_value(left, out);
            collect_value(right, out);
        }
        EquationBody::Other { left, right, .. } => {
            collect_value(left, out);
            for v in right {
                collect_value(v, out);
            }
        }
        EquationBody::Between(b) => {
            collect_value(&b.field, out);
            collect_value(&b.low, out);
            collect_value(&b.high, out);
        }
        EquationBody::Nested(inner) => collect_equation_list(inner, out),
    }
}

fn collect_function(f: &Function, out: &mut Vec<Parameter>) {
    for p in &f.params {
        collect_value(p, out);
    }
}

fn collect_case_when(c: &CaseWhen, out: &mut Vec<Parameter>) {
    for arm in &c.arms {
        collect_equation_list(&arm.condition, out);
        collect_value(&arm.then, out);
    }
    if let Some(e) = &c.r#else {
        collect_value(e, out);
    }
}

fn collect_value(value: &Value, out: &mut Vec<Parameter>) {
    match value {
        Value::Ident(_) => {}
        Value::Parameter(p) => out.push(p.clone()),
        Value::Subquery(sel) => collect_select(sel, out),
        Value::Function(f) => collect_function(f, out),
        Value::CaseWhen(c) => collect_case_when(c, out),
        Value::Number(n) => {
            for term in &n.terms {
                collect_value(&term.value, out);
            }
        }
        Value::Concatenation(items) => {
            for v in items {
                collect_value(v, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::unmarshal;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_params_in_left_to_right_order() {
        let stmt = unmarshal("SELECT A FROM T WHERE A = :x AND B IN (:y, :z)").unwrap();
        let names: Vec<String> = stmt.params().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec![":x".to_string(), ":y".to_string(), ":z".to_string()]);
    }

    #[test]
    fn collects_params_from_nested_subquery() {
        let stmt = unmarshal("SELECT A FROM T WHERE A IN (SELECT B FROM U WHERE B = :inner)").unwrap();
        let names: Vec<String> = stmt.params().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec![":inner".to_string()]);
    }

    #[test]
    fn remove_duplicate_params_keeps_first_occurrence() {
        let pars = vec![Parameter::new(":x"), Parameter::new(":y"), Parameter::new(":x")];
        let deduped = remove_duplicate_params(pars);
        assert_eq!(deduped, vec![Parameter::new(":x"), Parameter::new(":y")]);
    }

    #[test]
    fn find_params_by_string_ignores_string_literals() {
        let pars = find_params_by_string("SELECT * FROM T WHERE A = :x AND B = ':not_a_param'");
        assert_eq!(pars, vec![Parameter::new(":x")]);
    }
}
