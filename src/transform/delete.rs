// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component E.2: structural parameter deletion.
//!
//! Every node is walked and rebuilt from scratch; a node that becomes
//! semantically incomplete after its matched parameters are pruned removes
//! itself, forcing its parent to react the same way, all the way up to
//! whichever ancestor can absorb the gap (an `EquationList` dropping one of
//! its items, a `Select` dropping a table from a join chain, and so on).

use std::collections::HashSet;

use crate::ast::{
    CaseWhen, CaseWhenArm, Delete, Equation, EquationBody, EquationList, Function, Insert,
    InsertValues, Number, NumberTerm, OrderBy, OrderClause, Select, SelectField, SelectItem,
    SelectTable, Statement, TableRef, Update, UpdateAssignment, Value,
};

impl Statement {
    /// Removes every occurrence of a parameter named in `pars`, dropping
    /// whatever ancestor structure becomes incomplete as a result. See the
    /// module docs for the general rule and `SPEC_FULL.md` §4.E.2 for the
    /// per-node-kind detail.
    pub fn delete_params(&self, pars: &[crate::ast::Parameter]) -> Statement {
        let names: HashSet<&str> = pars.iter().map(|p| p.name.as_str()).collect();
        match self {
            Statement::Select(s) => Statement::Select(delete_select(s, &names)),
            Statement::Insert(i) => Statement::Insert(delete_insert(i, &names)),
            Statement::Update(u) => Statement::Update(delete_update(u, &names)),
            Statement::Delete(d) => Statement::Delete(delete_delete(d, &names)),
        }
    }
}

fn delete_value(v: &Value, names: &HashSet<&str>) -> Option<Value> {
    match v {
        Value::Ident(_) => Some(v.clone()),
        Value::Parameter(p) => {
            if names.contains(p.name.as_str()) {
                None
            } else {
                Some(v.clone())
            }
        }
        Value::Subquery(sel) => Some(Value::Subquery(Box::new(delete_select(sel, names)))),
        Value::Function(f) => delete_function(f, names).map(Value::Function),
        Value::CaseWhen(c) => delete_case_when(c, names).map(Value::CaseWhen),
        Value::Number(n) => delete_number(n, names),
        Value::Concatenation(items) => {
            let survivors: Vec<Value> = items.iter().filter_map(|v| delete_value(v, names)).collect();
            if survivors.is_empty() {
                None
            } else {
                Some(Value::Concatenation(survivors))
            }
        }
    }
}

/// Returns the surviving `Value` directly -- a `Number` never has exactly
/// one term (the parser never builds one that way either; see
/// `ast::Value::Number`'s invariant), so a deletion that leaves one survivor
/// unwraps it to a plain value instead of a one-term `Number`.
fn delete_number(n: &Number, names: &HashSet<&str>) -> Option<Value> {
    let mut survivors: Vec<NumberTerm> = Vec::new();
    for term in &n.terms {
        if let Some(value) = delete_value(&term.value, names) {
            survivors.push(NumberTerm { value, operator: term.operator.clone() });
        }
    }
    match survivors.len() {
        0 => None,
        1 => {
            let term = survivors.into_iter().next().unwrap();
            Some(term.value)
        }
        _ => {
            survivors[0].operator = String::new();
            Some(Value::Number(Number { terms: survivors }))
        }
    }
}

fn delete_function(f: &Function, names: &HashSet<&str>) -> Option<Function> {
    let params: Option<Vec<Value>> = f.params.iter().map(|v| delete_value(v, names)).collect();
    params.map(|params| Function { name: f.name.clone(), params })
}

fn delete_case_when(c: &CaseWhen, names: &HashSet<&str>) -> Option<CaseWhen> {
    let arms: Vec<CaseWhenArm> = c
        .arms
        .iter()
        .filter_map(|arm| {
            let condition = delete_equation_list(&arm.condition, names);
            if condition.items.is_empty() {
                return None;
            }
            let then = delete_value(&arm.then, names)?;
            Some(CaseWhenArm { condition, then })
        })
        .collect();
    if arms.is_empty() {
        return None;
    }
    let r#else = c.r#else.as_ref().and_then(|e| delete_value(e, names)).map(Box::new);
    Some(CaseWhen { arms, r#else })
}

fn delete_equation(eq: &Equation, names: &HashSet<&str>) -> Option<Equation> {
    let body = match &eq.body {
        EquationBody::Normal { left, op, right } => {
            let left = delete_value(left, names)?;
            let right = delete_value(right, names)?;
            EquationBody::Normal { left, op: op.clone(), right }
        }
        EquationBody::Other { left, op, right } => {
            let left = delete_value(left, names)?;
            let survivors: Vec<Value> = right.iter().filter_map(|v| delete_value(v, names)).collect();
            if !right.is_empty() && survivors.is_empty() {
                return None;
            }
            EquationBody::Other { left, op: op.clone(), right: survivors }
        }
        EquationBody::Between(b) => {
            let field = delete_value(&b.field, names)?;
            let low = delete_value(&b.low, names)?;
            let high = delete_value(&b.high, names)?;
            EquationBody::Between(crate::ast::Between { field, low, high })
        }
        EquationBody::Nested(inner) => {
            let inner = delete_equation_list(inner, names);
            if inner.items.is_empty() {
                return None;
            }
            EquationBody::Nested(inner)
        }
    };
    Some(Equation { body, connector: eq.connector.clone() })
}

/// Drops pruned children and clears the first survivor's connector so the
/// reserialized clause never begins with a stray `AND`/`OR`.
fn delete_equation_list(list: &EquationList, names: &HashSet<&str>) -> EquationList {
    let mut items: Vec<Equation> = list.items.iter().filter_map(|eq| delete_equation(eq, names)).collect();
    if let Some(first) = items.first_mut() {
        first.connector = String::new();
    }
    EquationList { items }
}

fn delete_select(sel: &Select, names: &HashSet<&str>) -> Select {
    Select { items: sel.items.iter().map(|item| delete_select_item(item, names)).collect() }
}

fn delete_select_item(item: &SelectItem, names: &HashSet<&str>) -> SelectItem {
    let fields: Vec<SelectField> = item
        .fields
        .iter()
        .filter_map(|f| delete_value(&f.value, names).map(|value| SelectField { value, alias: f.alias.clone() }))
        .collect();
    let tables: Vec<SelectTable> = item.tables.iter().filter_map(|t| delete_select_table(t, names)).collect();
    let r#where = delete_equation_list(&item.r#where, names);
    let group_by: Vec<Value> = item.group_by.iter().filter_map(|v| delete_value(v, names)).collect();
    let having = delete_equation_list(&item.having, names);
    let order = item.order.as_ref().and_then(|o| delete_order(o, names));
    SelectItem { fields, tables, r#where, group_by, having, order, aggregate: item.aggregate.clone() }
}

fn delete_order(o: &OrderClause, names: &HashSet<&str>) -> Option<OrderClause> {
    match o {
        OrderClause::By(ob) => {
            let values: Vec<Value> = ob.values.iter().filter_map(|v| delete_value(v, names)).collect();
            if values.is_empty() {
                None
            } else {
                Some(OrderClause::By(OrderBy { values, collation: ob.collation.clone() }))
            }
        }
        OrderClause::Decode(f) => delete_function(f, names).map(OrderClause::Decode),
    }
}

/// Drops a table when its own reference vanishes (only possible for a
/// nested join chain that loses every element); otherwise keeps the table
/// and, if its `ON` clause had operands that were pruned away entirely,
/// clears the join keyword rather than dropping the table itself. A join
/// with no `ON` clause to begin with (e.g. `JOIN T2` alone) must keep its
/// join keyword even though `join_on` is empty both before and after.
fn delete_select_table(t: &SelectTable, names: &HashSet<&str>) -> Option<SelectTable> {
    let table = delete_table_ref(&t.table, names)?;
    let join_on = delete_equation_list(&t.join_on, names);
    let join_kind = if !t.join_on.items.is_empty() && join_on.items.is_empty() {
        None
    } else {
        t.join_kind.clone()
    };
    Some(SelectTable { table, alias: t.alias.clone(), join_kind, join_on })
}

fn delete_table_ref(t: &TableRef, names: &HashSet<&str>) -> Option<TableRef> {
    match t {
        TableRef::Ident(s) => Some(TableRef::Ident(s.clone())),
        TableRef::Subquery(sel) => Some(TableRef::Subquery(Box::new(delete_select(sel, names)))),
        TableRef::Join(chain) => {
            let items: Vec<SelectTable> = chain.iter().filter_map(|t| delete_select_table(t, names)).collect();
            if items.is_empty() {
                None
            } else {
                Some(TableRef::Join(items))
            }
        }
    }
}

fn delete_insert(ins: &Insert, names: &HashSet<&str>) -> Insert {
    let values = match &ins.values {
        InsertValues::List(values) => {
            InsertValues::List(values.iter().filter_map(|v| delete_value(v, names)).collect())
        }
        InsertValues::Select(sel) => InsertValues::Select(Box::new(delete_select(sel, names))),
    };
    Insert { table: ins.table.clone(), fields: ins.fields.clone(), values }
}

fn delete_update(u: &Update, names: &HashSet<&str>) -> Update {
    let assignments: Vec<UpdateAssignment> = u
        .assignments
        .iter()
        .filter_map(|a| delete_value(&a.value, names).map(|value| UpdateAssignment { field: a.field.clone(), value }))
        .collect();
    Update { table: u.table.clone(), assignments, r#where: delete_equation_list(&u.r#where, names) }
}

fn delete_delete(d: &Delete, names: &HashSet<&str>) -> Delete {
    Delete { table: d.table.clone(), r#where: delete_equation_list(&d.r#where, names) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parameter;
    use crate::parser::unmarshal;
    use pretty_assertions::assert_eq;

    #[test]
    fn deleting_nothing_is_a_no_op() {
        let stmt = unmarshal("SELECT A FROM T WHERE A = :x AND B IS NULL").unwrap();
        let pruned = stmt.delete_params(&[]);
        assert_eq!(stmt, pruned);
    }

    #[test]
    fn deleting_a_normal_predicate_operand_drops_the_predicate() {
        let stmt = unmarshal("SELECT A FROM T WHERE A = :x AND B = 1").unwrap();
        let pruned = stmt.delete_params(&[Parameter::new(":x")]);
        let Statement::Select(sel) = pruned else { panic!("expected select") };
        let item = &sel.items[0];
        assert_eq!(item.r#where.items.len(), 1);
        assert_eq!(item.r#where.items[0].connector, "");
        match &item.r#where.items[0].body {
            EquationBody::Normal { op, .. } => assert_eq!(op, "="),
            other => panic!("expected Normal, got {other:?}"),
        }
    }

    #[test]
    fn deleting_all_in_list_values_drops_the_predicate() {
        let stmt = unmarshal("SELECT A FROM T WHERE B IN (:x) AND C = 1").unwrap();
        let pruned = stmt.delete_params(&[Parameter::new(":x")]);
        let Statement::Select(sel) = pruned else { panic!("expected select") };
        let item = &sel.items[0];
        assert_eq!(item.r#where.items.len(), 1);
        assert_eq!(item.r#where.items[0].connector, "");
    }

    #[test]
    fn is_null_survives_an_empty_delete_set() {
        let stmt = unmarshal("SELECT A FROM T WHERE A IS NULL").unwrap();
        let pruned = stmt.delete_params(&[]);
        assert_eq!(stmt, pruned);
    }

    #[test]
    fn join_without_on_clause_survives_an_empty_delete_set() {
        let stmt = unmarshal("SELECT A FROM T1 JOIN T2").unwrap();
        let pruned = stmt.delete_params(&[]);
        assert_eq!(stmt, pruned);
    }

    #[test]
    fn between_drops_when_any_operand_is_pruned() {
        let stmt = unmarshal("SELECT A FROM T WHERE A BETWEEN :lo AND 10 AND B = 1").unwrap();
        let pruned = stmt.delete_params(&[Parameter::new(":lo")]);
        let Statement::Select(sel) = pruned else { panic!("expected select") };
        let item = &sel.items[0];
        assert_eq!(item.r#where.items.len(), 1);
        match &item.r#where.items[0].body {
            EquationBody::Normal { op, .. } => assert_eq!(op, "="),
            other => panic!("expected Normal, got {other:?}"),
        }
    }
}
