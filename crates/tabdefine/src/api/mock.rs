//! In-memory table API for testing.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::error::ApiError;
use crate::schema::SchemaDocument;

use super::client::{DEFAULT_SCHEMA, Row, TableApi};

#[derive(Debug, Default)]
struct MockState {
    exists: bool,
    created: Option<SchemaDocument>,
    rows: Vec<(usize, Row)>,
    deletions: usize,
    failing_rows: HashSet<usize>,
    calls: Vec<String>,
}

/// Table API that records every call and keeps the table in memory.
#[derive(Debug)]
pub struct MockTableApi {
    schema: String,
    table: String,
    state: Mutex<MockState>,
}

impl MockTableApi {
    /// A mock for a table that does not exist yet.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            table: table.into(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Pretend the table already exists.
    pub fn with_existing_table(self) -> Self {
        self.lock().exists = true;
        self
    }

    /// Make the insert of zero-based row `index` fail with status 500.
    pub fn with_failing_row(self, index: usize) -> Self {
        self.lock().failing_rows.insert(index);
        self
    }

    /// Calls made so far, e.g. `"PUT rows/1"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// The last definition passed to `create_table`.
    pub fn created(&self) -> Option<SchemaDocument> {
        self.lock().created.clone()
    }

    /// Inserted rows with their indices.
    pub fn rows(&self) -> Vec<(usize, Row)> {
        self.lock().rows.clone()
    }

    pub fn deletions(&self) -> usize {
        self.lock().deletions
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TableApi for MockTableApi {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn table_exists(&self) -> Result<bool, ApiError> {
        let mut state = self.lock();
        state.calls.push("GET table".to_string());
        Ok(state.exists)
    }

    fn create_table(&self, document: &SchemaDocument) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push("PUT table".to_string());
        if state.exists {
            return Err(ApiError::UnexpectedStatus {
                method: "PUT".to_string(),
                url: self.table.clone(),
                expected: 201,
                actual: 400,
                body: "table exists".to_string(),
            });
        }
        state.exists = true;
        state.created = Some(document.clone());
        Ok(())
    }

    fn insert_row(&self, index: usize, row: &Row) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(format!("PUT rows/{}", index + 1));
        if state.failing_rows.contains(&index) {
            return Err(ApiError::UnexpectedStatus {
                method: "PUT".to_string(),
                url: format!("{}/rows/{}", self.table, index + 1),
                expected: 201,
                actual: 500,
                body: "mock failure".to_string(),
            });
        }
        state.rows.push((index, row.clone()));
        Ok(())
    }

    fn delete_table(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push("DELETE table".to_string());
        state.exists = false;
        state.deletions += 1;
        state.rows.clear();
        Ok(())
    }
}
