use async_trait::async_trait;
use reconcile::{
    ApplyReport, Baseline, BaselineRow, Cell, ColumnKind, EditableField, NewsStore, RecordId, ReconcileError,
    TableSchema, UpdatePayload,
};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, warn};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed news table.
#[derive(Clone)]
pub struct PgNewsStore {
    pool: PgPool,
}

impl PgNewsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rows shown to analysts, as JSON objects (uuids and timestamps as strings).
    pub async fn load_snapshot(&self, schema: &TableSchema, limit: i64) -> anyhow::Result<Vec<JsonValue>> {
        // table name is validated by TableSchema
        let sql = format!(
            r#"SELECT row_to_json(t) FROM (SELECT * FROM "{}" LIMIT $1) t"#,
            schema.table
        );
        let rows: Vec<JsonValue> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn load_baseline(&self, schema: &TableSchema, ids: Option<&[RecordId]>) -> reconcile::Result<Baseline> {
        let sql = schema.baseline_sql(ids.is_some());
        let mut query = sqlx::query(&sql);
        if let Some(ids) = ids {
            query = bind_id_array(query, schema.id_kind, ids);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReconcileError::Baseline(e.to_string()))?;

        let mut baseline = Baseline::new();
        for row in &rows {
            let raw: Option<String> = row
                .try_get(schema.id_column.as_str())
                .map_err(|e| ReconcileError::Baseline(e.to_string()))?;
            let Some(id) = raw.and_then(|s| RecordId::parse(&Cell::from(s), schema.id_kind)) else {
                warn!(table = %schema.table, "baseline: skipping row with null identifier");
                continue;
            };

            let mut fields = BaselineRow::with_capacity(schema.fields.len());
            for f in &schema.fields {
                fields.insert(f.name.clone(), decode(row, f)?);
            }
            baseline.insert(id, fields);
        }

        debug!(rows = baseline.len(), "baseline fetched");
        Ok(baseline)
    }

    async fn apply_updates(&self, schema: &TableSchema, batch: &[UpdatePayload]) -> reconcile::Result<ApplyReport> {
        let sql = schema.update_sql();
        let null = Cell::Null;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ReconcileError::Write(format!("begin: {e}")))?;

        let mut matched = 0u64;
        for p in batch {
            let mut query = sqlx::query(&sql);
            for f in &schema.fields {
                query = bind_cell(query, f.kind, p.get(&f.name).unwrap_or(&null));
            }
            query = bind_id(query, schema.id_kind, &p.id);

            let res = query.execute(&mut *tx).await;
            match res {
                Ok(res) => {
                    if res.rows_affected() == 0 {
                        debug!(id = %p.id, "update matched no row");
                    }
                    matched += res.rows_affected();
                }
                Err(e) => {
                    if let Err(rb) = tx.rollback().await {
                        warn!(id = %p.id, "rollback after failed update also failed: {rb}");
                    }
                    return Err(ReconcileError::Write(format!("record {}: {e}", p.id)));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| ReconcileError::Write(format!("commit: {e}")))?;

        Ok(ApplyReport { attempted: batch.len(), matched })
    }
}

fn decode(row: &PgRow, f: &EditableField) -> reconcile::Result<Cell> {
    let name = f.name.as_str();
    let cell = match f.kind {
        ColumnKind::Bool => row.try_get::<Option<bool>, _>(name).map(Cell::from),
        ColumnKind::Int => row.try_get::<Option<i64>, _>(name).map(Cell::from),
        // uuid columns are cast to text in the baseline query
        ColumnKind::Text | ColumnKind::Uuid => row.try_get::<Option<String>, _>(name).map(Cell::from),
    };
    cell.map_err(|e| ReconcileError::Baseline(format!("column '{name}': {e}")))
}

/// Nulls are typed by the column; everything else goes in as its own type and
/// the server decides whether it fits.
fn bind_cell<'q>(query: PgQuery<'q>, kind: ColumnKind, cell: &Cell) -> PgQuery<'q> {
    match cell {
        Cell::Null => match kind {
            ColumnKind::Bool => query.bind(None::<bool>),
            ColumnKind::Int => query.bind(None::<i64>),
            ColumnKind::Text => query.bind(None::<String>),
            ColumnKind::Uuid => query.bind(None::<uuid::Uuid>),
        },
        Cell::Bool(b) => query.bind(*b),
        Cell::Int(i) => query.bind(*i),
        Cell::Float(f) => query.bind(*f),
        Cell::Text(s) => query.bind(s.clone()),
        Cell::Uuid(u) => query.bind(*u),
        Cell::Other(v) => query.bind(v.clone()),
    }
}

/// Ids that could not be keys of the column are left out; they count as unknown.
fn bind_id_array<'q>(query: PgQuery<'q>, kind: ColumnKind, ids: &[RecordId]) -> PgQuery<'q> {
    match kind {
        ColumnKind::Uuid => query.bind(ids.iter().filter_map(RecordId::as_uuid).collect::<Vec<uuid::Uuid>>()),
        ColumnKind::Int => query.bind(ids.iter().filter_map(RecordId::as_i64).collect::<Vec<i64>>()),
        ColumnKind::Text | ColumnKind::Bool => {
            query.bind(ids.iter().map(|id| id.as_str().to_string()).collect::<Vec<String>>())
        }
    }
}

fn bind_id<'q>(query: PgQuery<'q>, kind: ColumnKind, id: &RecordId) -> PgQuery<'q> {
    match kind {
        ColumnKind::Uuid => match id.as_uuid() {
            Some(u) => query.bind(u),
            None => query.bind(id.as_str().to_string()),
        },
        ColumnKind::Int => match id.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(id.as_str().to_string()),
        },
        ColumnKind::Text | ColumnKind::Bool => query.bind(id.as_str().to_string()),
    }
}
