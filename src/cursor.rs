use crate::error::SourceError;

/// A forward only cursor over the rows of one result set.
///
/// This trait is the complete capability set this crate consumes from an external tabular data
/// source. Implement it for whatever handle your data source hands out for an open query; the
/// readers in this crate take ownership of the implementation, drive it forward row by row and
/// call [`Cursor::close`] exactly once after the last row.
///
/// # Contract
///
/// * The column names must be stable and in result set order for the entire lifetime of the
///   cursor. Names are unique within one result set; this crate does not verify uniqueness.
/// * A freshly opened cursor is positioned at or before the first row. [`Cursor::move_to_first`]
///   positions it on the first row, every further advance is [`Cursor::move_to_next`]. There is
///   no way back, in line with the forward only design of this crate.
/// * The typed getters are only called for cells whose stored kind matches the requested one.
///   Which kind is requested for a column is decided by the binding plan of the target type (see
///   [`crate::Bindable`]). Calling a getter with a mismatched kind is a contract violation on the
///   callers side of this trait; implementations are free to return garbage, but are encouraged
///   to report an error, which this crate forwards as [`crate::Error::Source`].
/// * After [`Cursor::close`] returned no further method is invoked on the instance.
pub trait Cursor {
    /// Names of the columns of the result set, in column order. Position in this slice is the
    /// column index used by all other methods.
    fn column_names(&self) -> &[String];

    /// Positions the cursor on the first row. `true` if a row is now positioned, `false` if the
    /// result set is empty.
    fn move_to_first(&mut self) -> Result<bool, SourceError>;

    /// Advances the cursor to the next row. `true` if a row is now positioned, `false` if the
    /// previous row was the last one.
    fn move_to_next(&mut self) -> Result<bool, SourceError>;

    /// `true` if the cell at `index` in the current row holds no value.
    fn is_null(&mut self, index: usize) -> Result<bool, SourceError>;

    /// Reads the cell at `index` in the current row as a 32 bit integer.
    fn get_int(&mut self, index: usize) -> Result<i32, SourceError>;

    /// Reads the cell at `index` in the current row as text.
    fn get_text(&mut self, index: usize) -> Result<String, SourceError>;

    /// Reads the cell at `index` in the current row as a 64 bit integer.
    fn get_long(&mut self, index: usize) -> Result<i64, SourceError>;

    /// Reads the cell at `index` in the current row as a 32 bit float.
    fn get_float(&mut self, index: usize) -> Result<f32, SourceError>;

    /// Reads the cell at `index` in the current row as a 64 bit float.
    fn get_double(&mut self, index: usize) -> Result<f64, SourceError>;

    /// Releases the resources of the result set. Called exactly once by the readers of this
    /// crate, either after the last row has been consumed or then a reader is dropped early.
    fn close(&mut self) -> Result<(), SourceError>;
}

/// A data source which can open queries into [`Cursor`]s.
///
/// Only required for the query based construction of the readers (e.g. [`crate::Reader::query`]).
/// If your application opens cursors by other means, hand them to [`crate::Reader::new`] directly
/// and ignore this trait.
pub trait Provider {
    /// Value describing one query against this source. A connection string based source may
    /// choose `str`, a richer source whatever statement description it supports.
    type Query: ?Sized;

    /// The cursor type produced by executing a query.
    type Cursor: Cursor;

    /// Executes the query and returns a cursor over its result set, positioned at or before the
    /// first row.
    fn query(&mut self, query: &Self::Query) -> Result<Self::Cursor, SourceError>;
}
