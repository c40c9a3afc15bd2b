use crate::{
    constants::SAMPLE_ROWS_IN_TABLE_INFO, errors::PromptError, providers::db::storage::Storage,
};
use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    types::{
        chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc},
        BigDecimal, Uuid,
    },
    Column, Row, TypeInfo, ValueRef,
};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Composes a PostgreSQL connection URL from its parts.
///
/// Nothing is validated: missing parts produce a URL that only fails once a
/// connection is attempted.
pub fn build_database_url(
    username: &str,
    password: &str,
    host: &str,
    port: &str,
    db_name: &str,
) -> String {
    format!("postgresql://{username}:{password}@{host}:{port}/{db_name}")
}

/// A provider for querying a PostgreSQL database through `sqlx`.
///
/// The connection pool is created on first use, not at construction. Cloning
/// shares the same pool.
#[derive(Clone)]
pub struct PostgresProvider {
    database_url: String,
    schema: String,
    pool: Arc<OnceCell<PgPool>>,
}

impl PostgresProvider {
    /// Creates a provider for the `public` schema of `database_url`.
    pub fn new(database_url: String) -> Self {
        Self::with_schema(database_url, "public".to_string())
    }

    /// Creates a provider that describes the tables of `schema`.
    pub fn with_schema(database_url: String, schema: String) -> Self {
        Self {
            database_url,
            schema,
            pool: Arc::new(OnceCell::new()),
        }
    }

    async fn pool(&self) -> Result<&PgPool, PromptError> {
        self.pool
            .get_or_try_init(|| async {
                info!(schema = %self.schema, "Connecting to PostgreSQL.");
                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&self.database_url)
                    .await
                    .map_err(|e| PromptError::StorageConnection(e.to_string()))
            })
            .await
    }

    async fn sample_rows(&self, pool: &PgPool, table: &str) -> Result<String, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {SAMPLE_ROWS_IN_TABLE_INFO}",
            quote_identifier(&self.schema),
            quote_identifier(table)
        );
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        let mut lines = Vec::with_capacity(rows.len() + 1);
        if let Some(first) = rows.first() {
            let header: Vec<&str> = first.columns().iter().map(|c| c.name()).collect();
            lines.push(header.join("\t"));
        }
        for row in &rows {
            let cells: Vec<String> = (0..row.len())
                .map(|i| render_cell(&pg_value_to_json(row, i)))
                .collect();
            lines.push(cells.join("\t"));
        }
        Ok(lines.join("\n"))
    }
}

impl Debug for PostgresProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresProvider")
            .field("schema", &self.schema)
            .field("connected", &self.pool.initialized())
            .finish_non_exhaustive()
    }
}

/// Wraps an identifier in double quotes, doubling any embedded quote.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a JSON value the way it should appear in a sample-row table.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts the column at `index` of a Postgres row to a `serde_json::Value`.
///
/// A cell that cannot be decoded (e.g. a `NaN` numeric) becomes a `<TYPE>`
/// placeholder instead of failing the whole row.
fn pg_value_to_json(row: &PgRow, index: usize) -> Value {
    let type_name = row
        .try_get_raw(index)
        .map(|raw| raw.type_info().name().to_string())
        .unwrap_or_else(|_| "UNKNOWN".to_string());

    decode_cell(row, index, &type_name).unwrap_or_else(|e| {
        debug!(column = index, type_name = %type_name, "Could not decode cell: {e}");
        Value::String(format!("<{type_name}>"))
    })
}

fn decode_cell(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(index)?),
        "INT2" => Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => float_to_json(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => float_to_json(row.try_get::<f64, _>(index)?),
        "NUMERIC" => {
            let decimal = row.try_get::<BigDecimal, _>(index)?.to_string();
            decimal
                .parse::<Number>()
                .map(Value::Number)
                .unwrap_or(Value::String(decimal))
        }
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            Value::String(row.try_get::<String, _>(index)?)
        }
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "TIMESTAMP" => Value::String(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
        "TIMESTAMPTZ" => Value::String(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index)?,
        "UUID" => Value::String(row.try_get::<Uuid, _>(index)?.to_string()),
        other => Value::String(format!("<{other}>")),
    };
    Ok(value)
}

/// Groups `(table, column, data_type)` rows into tables, keeping their order.
///
/// Rows must arrive ordered by table; each consecutive run forms one table.
fn group_columns(rows: Vec<(String, String, String)>) -> Vec<(String, Vec<(String, String)>)> {
    let mut tables: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for (table, column, data_type) in rows {
        match tables.last_mut() {
            Some((name, columns)) if *name == table => columns.push((column, data_type)),
            _ => tables.push((table, vec![(column, data_type)])),
        }
    }
    tables
}

/// Renders one table as a `CREATE TABLE` statement, followed by its sample
/// rows in a comment block when they are available.
fn render_table_block(table: &str, columns: &[(String, String)], sample: Option<&str>) -> String {
    let definition = columns
        .iter()
        .map(|(column, data_type)| {
            format!("\t{} {}", quote_identifier(column), data_type.to_uppercase())
        })
        .collect::<Vec<_>>()
        .join(",\n");
    let mut block = format!("CREATE TABLE {} (\n{definition}\n)", quote_identifier(table));

    if let Some(sample) = sample {
        block.push_str(&format!(
            "\n\n/*\n{SAMPLE_ROWS_IN_TABLE_INFO} rows from {table} table:\n{sample}\n*/"
        ));
    }
    block
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[async_trait]
impl Storage for PostgresProvider {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    async fn table_info(&self) -> Result<String, PromptError> {
        let pool = self.pool().await?;

        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT table_name::text, column_name::text, data_type::text \
             FROM information_schema.columns \
             WHERE table_schema = $1 \
             ORDER BY table_name, ordinal_position",
        )
        .bind(&self.schema)
        .fetch_all(pool)
        .await
        .map_err(|e| PromptError::StorageQueryFailed(e.to_string()))?;

        let tables = group_columns(columns);
        let mut blocks = Vec::with_capacity(tables.len());
        for (table, cols) in &tables {
            let sample = match self.sample_rows(pool, table).await {
                Ok(sample) => Some(sample),
                Err(e) => {
                    warn!(table = %table, "Could not fetch sample rows: {e}");
                    None
                }
            };
            blocks.push(render_table_block(table, cols, sample.as_deref()));
        }

        debug!(tables = tables.len(), "Built table info.");
        Ok(blocks.join("\n\n"))
    }

    async fn execute_sql(&self, sql: &str) -> Result<String, PromptError> {
        debug!(sql = %sql, "--> Executing PostgreSQL query");
        let pool = self.pool().await?;

        let rows = sqlx::query(sql)
            .fetch_all(pool)
            .await
            .map_err(|e| PromptError::StorageQueryFailed(e.to_string()))?;

        let mut json_results: Vec<Value> = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut row_map = Map::new();
            for (i, column) in row.columns().iter().enumerate() {
                row_map.insert(column.name().to_string(), pg_value_to_json(row, i));
            }
            json_results.push(Value::Object(row_map));
        }

        Ok(serde_json::to_string(&json_results)?)
    }
}
