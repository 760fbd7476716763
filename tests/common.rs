//! Shared in memory data source for the integration tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rowbind::{Cursor, Provider, SourceError};

/// One cell of an in memory result set.
#[derive(Clone, Debug)]
pub enum Cell {
    Null,
    Int(i32),
    Text(String),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Observer for how often a [`MemCursor`] has been closed. Remains valid after the cursor has
/// been moved into a reader.
#[derive(Clone)]
pub struct CloseCount(Arc<AtomicUsize>);

impl CloseCount {
    pub fn value(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// In memory implementation of [`Cursor`]. Strict about its contract: cells read with a
/// mismatched kind, null cells read as values and any use after close are reported as errors
/// rather than tolerated, so sloppy callers fail tests.
pub struct MemCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    /// `None` until positioned by `move_to_first`.
    position: Option<usize>,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

impl MemCursor {
    pub fn new(columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        for row in &rows {
            assert_eq!(columns.len(), row.len(), "row width must match column count");
        }
        MemCursor {
            columns: columns.iter().map(|name| name.to_string()).collect(),
            rows,
            position: None,
            closes: Arc::new(AtomicUsize::new(0)),
            fail_close: false,
        }
    }

    /// Lets every call to `close` fail.
    pub fn fail_on_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn close_count(&self) -> CloseCount {
        CloseCount(Arc::clone(&self.closes))
    }

    fn cell(&self, index: usize) -> Result<&Cell, SourceError> {
        if self.closes.load(Ordering::SeqCst) > 0 {
            return Err("cursor used after close".into());
        }
        let row = self
            .position
            .and_then(|position| self.rows.get(position))
            .ok_or("no row positioned")?;
        row.get(index).ok_or_else(|| "column index out of bounds".into())
    }
}

impl Cursor for MemCursor {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn move_to_first(&mut self) -> Result<bool, SourceError> {
        self.position = Some(0);
        Ok(!self.rows.is_empty())
    }

    fn move_to_next(&mut self) -> Result<bool, SourceError> {
        let next = self.position.map_or(0, |position| position + 1);
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn is_null(&mut self, index: usize) -> Result<bool, SourceError> {
        Ok(matches!(self.cell(index)?, Cell::Null))
    }

    fn get_int(&mut self, index: usize) -> Result<i32, SourceError> {
        match self.cell(index)? {
            Cell::Int(value) => Ok(*value),
            other => Err(format!("cell does not hold an integer: {other:?}").into()),
        }
    }

    fn get_text(&mut self, index: usize) -> Result<String, SourceError> {
        match self.cell(index)? {
            Cell::Text(value) => Ok(value.clone()),
            other => Err(format!("cell does not hold text: {other:?}").into()),
        }
    }

    fn get_long(&mut self, index: usize) -> Result<i64, SourceError> {
        match self.cell(index)? {
            Cell::Long(value) => Ok(*value),
            other => Err(format!("cell does not hold a long: {other:?}").into()),
        }
    }

    fn get_float(&mut self, index: usize) -> Result<f32, SourceError> {
        match self.cell(index)? {
            Cell::Float(value) => Ok(*value),
            other => Err(format!("cell does not hold a float: {other:?}").into()),
        }
    }

    fn get_double(&mut self, index: usize) -> Result<f64, SourceError> {
        match self.cell(index)? {
            Cell::Double(value) => Ok(*value),
            other => Err(format!("cell does not hold a double: {other:?}").into()),
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err("close failed".into())
        } else {
            Ok(())
        }
    }
}

/// In memory implementation of [`Provider`], serving one prepared result set per instance.
pub struct MemProvider {
    cursor: Option<MemCursor>,
}

impl MemProvider {
    pub fn new(cursor: MemCursor) -> Self {
        MemProvider {
            cursor: Some(cursor),
        }
    }
}

impl Provider for MemProvider {
    type Query = str;
    type Cursor = MemCursor;

    fn query(&mut self, _query: &str) -> Result<MemCursor, SourceError> {
        self.cursor.take().ok_or_else(|| "result set already served".into())
    }
}

#[test]
fn in_memory_cursor_navigates_forward() {
    let mut cursor = MemCursor::new(
        &["id"],
        vec![vec![Cell::Int(1)], vec![Cell::Int(2)]],
    );

    assert!(cursor.move_to_first().unwrap());
    assert_eq!(1, cursor.get_int(0).unwrap());
    assert!(cursor.move_to_next().unwrap());
    assert_eq!(2, cursor.get_int(0).unwrap());
    assert!(!cursor.move_to_next().unwrap());
}
