//! In-memory data source.
//!
//! A complete [`DataSource`] over plain JSON rows, used by the offline
//! serve mode and by tests that need a controllable backend. Writes go
//! through the same change-notification channel as the real service.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    ChannelRegistry, DataSource, Filter, RowQuery, SourceError, Subscription,
};

#[derive(Default)]
pub struct MemorySource {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    registry: Arc<ChannelRegistry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table wholesale and notify its subscribers.
    pub fn replace_table(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .expect("memory tables poisoned")
            .insert(table.to_string(), rows);
        self.registry.notify(table);
    }

    /// Append one row and notify subscribers.
    pub fn insert_row(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .expect("memory tables poisoned")
            .entry(table.to_string())
            .or_default()
            .push(row);
        self.registry.notify(table);
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("memory objects poisoned").len()
    }

    fn string_field(row: &Value, column: &str) -> Option<String> {
        match row.get(column) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    fn matches(row: &Value, filter: &Filter) -> bool {
        match filter {
            Filter::Eq(column, value) => {
                Self::string_field(row, column).as_deref() == Some(value.as_str())
            }
            Filter::Contains(column, needle) => Self::string_field(row, column)
                .map(|field| field.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Filter::AnyOf(column, values) => Self::string_field(row, column)
                .map(|field| values.iter().any(|v| *v == field))
                .unwrap_or(false),
        }
    }

    fn compare_by_column(a: &Value, b: &Value, column: &str) -> Ordering {
        match (
            a.get(column).and_then(Value::as_f64),
            b.get(column).and_then(Value::as_f64),
        ) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            // Fall back to string comparison; rows without the column sort
            // first so a descending order puts them last.
            _ => Self::string_field(a, column).cmp(&Self::string_field(b, column)),
        }
    }

    fn apply_query(rows: &[Value], query: &RowQuery) -> Vec<Value> {
        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| Self::matches(row, f)))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            selected.sort_by(|a, b| {
                let ord = Self::compare_by_column(a, b, &order.column);
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }

        selected
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, SourceError> {
        let tables = self.tables.lock().expect("memory tables poisoned");
        let rows = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::apply_query(rows, query))
    }

    async fn update(
        &self,
        table: &str,
        query: &RowQuery,
        patch: Value,
    ) -> Result<(), SourceError> {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(SourceError::Config(format!(
                    "update patch must be a JSON object, got {}",
                    other
                )))
            }
        };

        let mut touched = 0usize;
        {
            let mut tables = self.tables.lock().expect("memory tables poisoned");
            if let Some(rows) = tables.get_mut(table) {
                for row in rows.iter_mut() {
                    if !query.filters.iter().all(|f| Self::matches(row, f)) {
                        continue;
                    }
                    if let Value::Object(fields) = row {
                        for (key, value) in &patch {
                            fields.insert(key.clone(), value.clone());
                        }
                        touched += 1;
                    }
                }
            }
        }

        if touched > 0 {
            self.registry.notify(table);
        }
        Ok(())
    }

    fn subscribe(&self, table: &str) -> Subscription {
        self.registry.subscribe(table)
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SourceError> {
        self.objects
            .lock()
            .expect("memory objects poisoned")
            .insert(format!("{}/{}", bucket, path), bytes);
        Ok(format!("memory://{}/{}", bucket, path))
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> Result<(), SourceError> {
        self.objects
            .lock()
            .expect("memory objects poisoned")
            .remove(&format!("{}/{}", bucket, path));
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        Ok(true)
    }
}
