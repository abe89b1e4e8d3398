use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::ApiError;

/// SQL bindable value enum
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Null,
}

/// SQL update container
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Builds a dynamic UPDATE from a JSON payload. Only columns in `allowed`
/// may appear; anything else is rejected rather than interpolated into SQL.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: &str,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::Validation(format!("Unknown field: {key}")));
        }

        columns.push(format!("{key} = ?"));

        match value {
            Value::String(s) => values.push(SqlValue::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => {
                return Err(ApiError::Validation(format!(
                    "Unsupported value type for field: {key}"
                )));
            }
        }
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );
    values.push(SqlValue::String(id_value.to_string()));

    Ok(SqlUpdate { sql, values })
}

pub async fn execute_update(pool: &SqlitePool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["name", "email", "is_active"];

    #[test]
    fn builds_set_clause_from_allowed_fields() {
        let payload = json!({"name": "Budi", "is_active": false});
        let update = build_update_sql("employees", &payload, ALLOWED, "id", "e1").unwrap();
        assert!(update.sql.starts_with("UPDATE employees SET "));
        assert!(update.sql.ends_with("WHERE id = ?"));
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let payload = json!({"name": "Budi", "role": "admin"});
        assert!(build_update_sql("employees", &payload, ALLOWED, "id", "e1").is_err());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let payload = json!({});
        assert!(build_update_sql("employees", &payload, ALLOWED, "id", "e1").is_err());
    }
}
