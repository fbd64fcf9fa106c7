//! Converts the engine's generated SQL into executable commands.
//!
//! Statements are parsed with sqlparser (Postgres dialect) and bound
//! against the parameter list. Only the shapes the statement builders
//! emit are accepted; anything else is a storage failure, since no other
//! SQL can legitimately reach the backend.

use sqlparser::ast as sql_ast;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::table::{PhysicalType, StoredColumn};
use crate::core::{DbError, ID_COLUMN, Result, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlCommand {
    CreateTable {
        table: String,
        columns: Vec<StoredColumn>,
        if_not_exists: bool,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
        returning_id: bool,
    },
    Select {
        table: String,
        count_only: bool,
        filter_id: Option<i64>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        id: i64,
    },
    Delete {
        table: String,
        id: i64,
    },
}

pub fn parse_command(sql: &str, params: &[Value]) -> Result<SqlCommand> {
    let dialect = PostgreSqlDialect {};
    let mut statements = Parser::parse_sql(&dialect, sql)
        .map_err(|e| DbError::StorageFailure(format!("SQL parse error: {}", e)))?;

    if statements.len() != 1 {
        return Err(DbError::StorageFailure(
            "expected exactly one statement".to_string(),
        ));
    }

    match statements.remove(0) {
        sql_ast::Statement::CreateTable(create) => convert_create(create),
        sql_ast::Statement::Insert(insert) => convert_insert(insert, params),
        sql_ast::Statement::Query(query) => convert_query(*query, params),
        sql_ast::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => convert_update(table, assignments, selection, params),
        sql_ast::Statement::Delete(delete) => convert_delete(delete, params),
        other => Err(unsupported(format!("statement: {}", other))),
    }
}

fn convert_create(create: sql_ast::CreateTable) -> Result<SqlCommand> {
    let table = object_name(&create.name)?;

    let mut columns = Vec::with_capacity(create.columns.len());
    for col in create.columns {
        let physical = physical_type(&col.data_type)?;
        let mut nullable = true;
        let mut primary_key = false;
        for opt in &col.options {
            match &opt.option {
                sql_ast::ColumnOption::NotNull => nullable = false,
                sql_ast::ColumnOption::Unique { is_primary, .. } if *is_primary => {
                    primary_key = true;
                }
                _ => {}
            }
        }
        columns.push(StoredColumn {
            name: col.name.value,
            physical,
            nullable,
            primary_key,
        });
    }

    Ok(SqlCommand::CreateTable {
        table,
        columns,
        if_not_exists: create.if_not_exists,
    })
}

fn convert_insert(insert: sql_ast::Insert, params: &[Value]) -> Result<SqlCommand> {
    let table = match &insert.table {
        sql_ast::TableObject::TableName(name) => object_name(name)?,
        _ => return Err(unsupported("INSERT target")),
    };

    let columns: Vec<String> = insert.columns.iter().map(|c| c.value.clone()).collect();

    // `DEFAULT VALUES` arrives without a source.
    let values = match insert.source {
        None => Vec::new(),
        Some(source) => {
            let sql_ast::SetExpr::Values(vals) = *source.body else {
                return Err(unsupported("INSERT source"));
            };
            let mut rows = vals.rows;
            if rows.len() != 1 {
                return Err(unsupported("multi-row INSERT"));
            }
            rows.remove(0)
                .iter()
                .map(|expr| bind_expr(expr, params))
                .collect::<Result<Vec<_>>>()?
        }
    };

    if values.len() != columns.len() {
        return Err(DbError::StorageFailure(format!(
            "INSERT has {} columns but {} values",
            columns.len(),
            values.len()
        )));
    }

    let returning_id = match insert.returning {
        None => false,
        Some(items) => {
            let only_id = items.len() == 1
                && matches!(
                    &items[0],
                    sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Identifier(ident))
                        if ident.value == ID_COLUMN
                );
            if !only_id {
                return Err(unsupported("RETURNING list"));
            }
            true
        }
    };

    Ok(SqlCommand::Insert {
        table,
        columns,
        values,
        returning_id,
    })
}

fn convert_query(query: sql_ast::Query, params: &[Value]) -> Result<SqlCommand> {
    let sql_ast::SetExpr::Select(select) = *query.body else {
        return Err(unsupported("query form"));
    };

    if select.from.len() != 1 || !select.from[0].joins.is_empty() {
        return Err(unsupported("FROM list"));
    }
    let table = match &select.from[0].relation {
        sql_ast::TableFactor::Table { name, .. } => object_name(name)?,
        _ => return Err(unsupported("FROM relation")),
    };

    let count_only = match select.projection.as_slice() {
        [sql_ast::SelectItem::Wildcard(_)] => false,
        [sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Function(func))]
            if func.name.to_string().eq_ignore_ascii_case("COUNT") =>
        {
            true
        }
        _ => return Err(unsupported("projection")),
    };

    let filter_id = select
        .selection
        .as_ref()
        .map(|expr| extract_id_filter(expr, params))
        .transpose()?;

    if let Some(order_by) = query.order_by {
        check_order_by(order_by)?;
    }

    let (limit, offset) = match query.limit_clause {
        None => (None, None),
        Some(sql_ast::LimitClause::LimitOffset { limit, offset, .. }) => {
            let limit = limit.map(|expr| bind_u64(&expr, params)).transpose()?;
            let offset = offset
                .map(|off| bind_u64(&off.value, params))
                .transpose()?;
            (limit, offset)
        }
        Some(_) => return Err(unsupported("LIMIT form")),
    };

    Ok(SqlCommand::Select {
        table,
        count_only,
        filter_id,
        limit,
        offset,
    })
}

/// The engine only ever orders by the serial key ascending.
fn check_order_by(order_by: sql_ast::OrderBy) -> Result<()> {
    let sql_ast::OrderByKind::Expressions(exprs) = order_by.kind else {
        return Err(unsupported("ORDER BY form"));
    };
    if exprs.len() != 1 {
        return Err(unsupported("ORDER BY list"));
    }

    let id_asc = matches!(
        &exprs[0].expr,
        sql_ast::Expr::Identifier(ident) if ident.value == ID_COLUMN
    ) && exprs[0].options.asc.unwrap_or(true);

    if !id_asc {
        return Err(unsupported("ORDER BY expression"));
    }
    Ok(())
}

fn convert_update(
    table: sql_ast::TableWithJoins,
    assignments: Vec<sql_ast::Assignment>,
    selection: Option<sql_ast::Expr>,
    params: &[Value],
) -> Result<SqlCommand> {
    let table = match table.relation {
        sql_ast::TableFactor::Table { name, .. } => object_name(&name)?,
        _ => return Err(unsupported("UPDATE target")),
    };

    let mut pairs = Vec::with_capacity(assignments.len());
    for assign in assignments {
        let column = match assign.target {
            sql_ast::AssignmentTarget::ColumnName(name) => object_name(&name)?,
            _ => return Err(unsupported("assignment target")),
        };
        pairs.push((column, bind_expr(&assign.value, params)?));
    }

    let id = match selection {
        Some(expr) => extract_id_filter(&expr, params)?,
        None => {
            return Err(DbError::StorageFailure(
                "UPDATE without a key filter is not allowed".to_string(),
            ));
        }
    };

    Ok(SqlCommand::Update {
        table,
        assignments: pairs,
        id,
    })
}

fn convert_delete(delete: sql_ast::Delete, params: &[Value]) -> Result<SqlCommand> {
    let tables = match delete.from {
        sql_ast::FromTable::WithFromKeyword(tables)
        | sql_ast::FromTable::WithoutKeyword(tables) => tables,
    };
    if tables.len() != 1 {
        return Err(unsupported("DELETE target"));
    }
    let table = match &tables[0].relation {
        sql_ast::TableFactor::Table { name, .. } => object_name(name)?,
        _ => return Err(unsupported("DELETE relation")),
    };

    let id = match delete.selection {
        Some(expr) => extract_id_filter(&expr, params)?,
        None => {
            return Err(DbError::StorageFailure(
                "DELETE without a key filter is not allowed".to_string(),
            ));
        }
    };

    Ok(SqlCommand::Delete { table, id })
}

/// Matches the one filter shape the builders produce: `"id" = $n`.
fn extract_id_filter(expr: &sql_ast::Expr, params: &[Value]) -> Result<i64> {
    if let sql_ast::Expr::BinaryOp {
        left,
        op: sql_ast::BinaryOperator::Eq,
        right,
    } = expr
        && let sql_ast::Expr::Identifier(ident) = left.as_ref()
        && ident.value == ID_COLUMN
    {
        let value = bind_expr(right, params)?;
        return value.as_i64().ok_or_else(|| {
            DbError::StorageFailure(format!("key filter expects an integer, got {}", value))
        });
    }
    Err(unsupported("WHERE clause"))
}

fn bind_u64(expr: &sql_ast::Expr, params: &[Value]) -> Result<u64> {
    let value = bind_expr(expr, params)?;
    match value {
        Value::Integer(i) if i >= 0 => Ok(i as u64),
        other => Err(DbError::StorageFailure(format!(
            "expected a non-negative integer, got {}",
            other
        ))),
    }
}

fn bind_expr(expr: &sql_ast::Expr, params: &[Value]) -> Result<Value> {
    match expr {
        sql_ast::Expr::Value(value) => bind_value(&value.value, params),
        other => Err(unsupported(format!("expression: {}", other))),
    }
}

fn bind_value(value: &sql_ast::Value, params: &[Value]) -> Result<Value> {
    match value {
        sql_ast::Value::Placeholder(p) => {
            let index = p
                .trim_start_matches('$')
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| {
                    DbError::StorageFailure(format!("invalid placeholder: {}", p))
                })?;
            params.get(index).cloned().ok_or_else(|| {
                DbError::StorageFailure(format!("parameter {} is not bound", p))
            })
        }
        sql_ast::Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Value::Integer(i))
            } else if let Ok(f) = n.parse::<f64>() {
                Ok(Value::Float(f))
            } else {
                Err(DbError::StorageFailure(format!("invalid number: {}", n)))
            }
        }
        sql_ast::Value::SingleQuotedString(s) => Ok(Value::Text(s.clone())),
        sql_ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        sql_ast::Value::Null => Ok(Value::Null),
        other => Err(unsupported(format!("literal: {}", other))),
    }
}

fn physical_type(dt: &sql_ast::DataType) -> Result<PhysicalType> {
    match dt {
        sql_ast::DataType::Text | sql_ast::DataType::Varchar(_) => Ok(PhysicalType::Text),
        sql_ast::DataType::Int(_) | sql_ast::DataType::Integer(_) => Ok(PhysicalType::Integer),
        sql_ast::DataType::BigInt(_) => Ok(PhysicalType::BigInt),
        sql_ast::DataType::Decimal(_) | sql_ast::DataType::Numeric(_) => {
            Ok(PhysicalType::Decimal)
        }
        sql_ast::DataType::Boolean | sql_ast::DataType::Bool => Ok(PhysicalType::Boolean),
        sql_ast::DataType::Date => Ok(PhysicalType::Date),
        sql_ast::DataType::Timestamp(_, _) => Ok(PhysicalType::Timestamp),
        // Serial types have no dedicated AST variant in every dialect.
        other if other.to_string().eq_ignore_ascii_case("BIGSERIAL") => {
            Ok(PhysicalType::BigSerial)
        }
        other => Err(DbError::StorageFailure(format!(
            "unsupported data type: {}",
            other
        ))),
    }
}

/// Pulls the bare name out of a (possibly quoted) object reference.
fn object_name(name: &sql_ast::ObjectName) -> Result<String> {
    match name.0.last() {
        Some(sql_ast::ObjectNamePart::Identifier(ident)) => Ok(ident.value.clone()),
        _ => Err(DbError::StorageFailure(format!(
            "invalid object name: {}",
            name
        ))),
    }
}

fn unsupported(what: impl std::fmt::Display) -> DbError {
    DbError::StorageFailure(format!("unsupported SQL {}", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlgen::{
        CreateTableBuilder, DeleteStatementBuilder, InsertStatementBuilder,
        UpdateStatementBuilder, select_by_id, select_count, select_page,
    };

    #[test]
    fn test_parse_create_table() {
        let sql = CreateTableBuilder::new("t_demo")
            .add_column("id", "BIGSERIAL", false, true)
            .add_column("note_x", "TEXT", false, false)
            .add_column("price_x", "DECIMAL", true, false)
            .build();

        let cmd = parse_command(&sql, &[]).unwrap();
        let SqlCommand::CreateTable {
            table,
            columns,
            if_not_exists,
        } = cmd
        else {
            panic!("expected CreateTable");
        };

        assert_eq!(table, "t_demo");
        assert!(if_not_exists);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].physical, PhysicalType::BigSerial);
        assert!(columns[0].primary_key);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].physical, PhysicalType::Text);
        assert!(!columns[1].nullable);
        assert_eq!(columns[2].physical, PhysicalType::Decimal);
        assert!(columns[2].nullable);
    }

    #[test]
    fn test_parse_insert_binds_placeholders() {
        let sql = InsertStatementBuilder::new("t_demo")
            .columns(vec!["note_x".to_string(), "count_x".to_string()])
            .build();
        let params = vec![Value::from("hello"), Value::Integer(3)];

        let cmd = parse_command(&sql, &params).unwrap();
        assert_eq!(
            cmd,
            SqlCommand::Insert {
                table: "t_demo".to_string(),
                columns: vec!["note_x".to_string(), "count_x".to_string()],
                values: vec![Value::from("hello"), Value::Integer(3)],
                returning_id: true,
            }
        );
    }

    #[test]
    fn test_parse_insert_default_values() {
        let sql = InsertStatementBuilder::new("t_demo").build();
        let cmd = parse_command(&sql, &[]).unwrap();
        assert_eq!(
            cmd,
            SqlCommand::Insert {
                table: "t_demo".to_string(),
                columns: vec![],
                values: vec![],
                returning_id: true,
            }
        );
    }

    #[test]
    fn test_parse_select_page() {
        let sql = select_page("t_demo");
        let cmd = parse_command(&sql, &[Value::Integer(10), Value::Integer(20)]).unwrap();
        assert_eq!(
            cmd,
            SqlCommand::Select {
                table: "t_demo".to_string(),
                count_only: false,
                filter_id: None,
                limit: Some(10),
                offset: Some(20),
            }
        );
    }

    #[test]
    fn test_parse_select_count_and_by_id() {
        let count = parse_command(&select_count("t_demo"), &[]).unwrap();
        assert_eq!(
            count,
            SqlCommand::Select {
                table: "t_demo".to_string(),
                count_only: true,
                filter_id: None,
                limit: None,
                offset: None,
            }
        );

        let by_id = parse_command(&select_by_id("t_demo"), &[Value::Integer(7)]).unwrap();
        assert_eq!(
            by_id,
            SqlCommand::Select {
                table: "t_demo".to_string(),
                count_only: false,
                filter_id: Some(7),
                limit: None,
                offset: None,
            }
        );
    }

    #[test]
    fn test_parse_update_and_delete() {
        let sql = UpdateStatementBuilder::new("t_demo")
            .columns(vec!["note_x".to_string()])
            .build();
        let cmd = parse_command(&sql, &[Value::from("new"), Value::Integer(5)]).unwrap();
        assert_eq!(
            cmd,
            SqlCommand::Update {
                table: "t_demo".to_string(),
                assignments: vec![("note_x".to_string(), Value::from("new"))],
                id: 5,
            }
        );

        let sql = DeleteStatementBuilder::new("t_demo").build();
        let cmd = parse_command(&sql, &[Value::Integer(5)]).unwrap();
        assert_eq!(
            cmd,
            SqlCommand::Delete {
                table: "t_demo".to_string(),
                id: 5,
            }
        );
    }

    #[test]
    fn test_rejects_foreign_shapes() {
        assert!(parse_command("DROP TABLE \"t_demo\"", &[]).is_err());
        assert!(parse_command("SELECT * FROM \"a_x\" JOIN \"b_x\" ON true", &[]).is_err());
        assert!(parse_command("UPDATE \"t_demo\" SET \"note_x\" = $1", &[Value::Null]).is_err());
        assert!(parse_command("DELETE FROM \"t_demo\"", &[]).is_err());
        assert!(parse_command("SELECT * FROM \"t_demo\"; SELECT 1", &[]).is_err());
    }

    #[test]
    fn test_unbound_parameter() {
        let err = parse_command(&select_by_id("t_demo"), &[]).unwrap_err();
        assert!(matches!(err, DbError::StorageFailure(msg) if msg.contains("$1")));
    }
}
