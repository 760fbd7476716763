//! # Rowbind
//!
//! Bind rows of forward only database cursors to typed Rust values.
//!
//! Many tabular data sources hand out their query results through a cursor: a forward only
//! handle over one result set, with named columns and per cell typed access. Consuming such a
//! result set by column index is noisy and brittle; this crate binds each row to an instance of
//! a target type instead, matching columns to setters by a naming convention, and drives the
//! whole scan through a resource safe iteration protocol which closes the cursor exactly once.
//!
//! The crate does not talk to any concrete data source. It consumes the [`Cursor`] trait (and
//! optionally [`Provider`], for opening queries) and leaves their implementation to you, which
//! keeps it equally at home over an embedded database, a network protocol or a test fixture.
//!
//! ## Binding convention
//!
//! For a column named `number` the expected setter is named `setNumber`: `set` plus the column
//! name with a capitalized first character (capitalizing `_` is a no op, so the `_id` column
//! maps to `set_id`). Target types register their setters by implementing [`Bindable`]; columns
//! without a matching setter are skipped silently, since binding only a subset of a result set
//! is common and intentional. Five value kinds are supported, see [`ValueKind`].
//!
//! ## Example
//!
//! ```
//! use rowbind::{Bindable, Cursor, Error, Reader, Setter};
//!
//! /// One entry of the phone call log.
//! #[derive(Default)]
//! struct Call {
//!     number: Option<String>,
//!     date: i64,
//! }
//!
//! impl Bindable for Call {
//!     fn setters() -> Vec<Setter<Self>> {
//!         vec![
//!             Setter::text("setNumber", |call: &mut Call, value| call.number = Some(value)),
//!             Setter::long_integer("setDate", |call: &mut Call, value| call.date = value),
//!         ]
//!     }
//! }
//!
//! /// Collects the call log from a cursor over the columns `number` and `date`.
//! fn collect_calls(cursor: impl Cursor) -> Result<Vec<Call>, Error> {
//!     let calls = Reader::<_, Call>::new(cursor)?;
//!     calls.collect()
//! }
//! ```
//!
//! Null cells leave the bound field untouched, so `Call::number` stays `None` for rows without a
//! number. A cell whose stored kind does not match the registered setter is a contract violation
//! of the source; well behaved sources report it as an error, which surfaces as
//! [`Error::Source`].
//!
//! ## Reusing one instance across rows
//!
//! Constructing a value per row is the right default, but scans over wide result sets may want
//! to avoid the allocation churn. [`ReusingReader`] resets and refills a single instance per row
//! instead; the target type additionally implements [`Resettable`].
//!
//! ## Sharing binding plans
//!
//! Matching columns to setters happens once per reader, not once per row. Applications opening
//! many cursors for the same target type can share the resulting [`BindingPlan`] across readers
//! through a [`BindingRegistry`], see [`Reader::with_registry`].

mod binding;
mod cursor;
mod error;
mod reader;
mod registry;

pub use self::{
    binding::{Bindable, BindingPlan, Setter, ValueKind, setter_name},
    cursor::{Cursor, Provider},
    error::{Error, SetterError, SourceError},
    reader::{Reader, Resettable, ReusingReader},
    registry::BindingRegistry,
};
