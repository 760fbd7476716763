use std::{sync::Arc, thread::panicking};

use log::warn;

use crate::{
    binding::{Bindable, BindingPlan},
    cursor::{Cursor, Provider},
    error::Error,
    registry::BindingRegistry,
};

/// Capability required of target types iterated in reuse mode, see [`ReusingReader`].
///
/// [`Resettable::reset`] must return the instance to a clean state, as if freshly constructed.
/// A field it leaves untouched keeps its value from the previous row, so a value present in row
/// `n` would leak into row `n + 1` if the corresponding column is null there.
pub trait Resettable {
    /// Returns the instance to a clean state before it receives the next row.
    fn reset(&mut self);
}

/// State of one forward only scan: the cursor handle and whether a not yet consumed row is
/// positioned. Owns the handle and releases it exactly once, on whichever exit path comes first
/// (exhaustion, failed row, drop).
struct Scan<C: Cursor> {
    /// `None` once the cursor has been released. Taking the handle out is the exactly once guard.
    cursor: Option<C>,
    has_row: bool,
}

impl<C> Scan<C>
where
    C: Cursor,
{
    /// Positions the cursor on its first row. An empty result set transitions to the terminal
    /// state immediately, releasing the cursor.
    fn start(mut cursor: C) -> Result<Self, Error> {
        let has_row = cursor
            .move_to_first()
            .map_err(|source| Error::source_call("move_to_first", source))?;
        let mut scan = Scan {
            cursor: Some(cursor),
            has_row,
        };
        if !scan.has_row {
            scan.release()?;
        }
        Ok(scan)
    }

    fn has_row(&self) -> bool {
        self.has_row
    }

    fn cursor_mut(&mut self) -> &mut C {
        self.cursor
            .as_mut()
            .expect("A positioned row implies an open cursor.")
    }

    /// Advances to the next row. Once the source reports no further row the scan is terminal and
    /// the cursor is released.
    fn advance(&mut self) -> Result<(), Error> {
        self.has_row = self
            .cursor_mut()
            .move_to_next()
            .map_err(|source| Error::source_call("move_to_next", source))?;
        if !self.has_row {
            self.release()?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), Error> {
        if let Some(mut cursor) = self.cursor.take() {
            cursor
                .close()
                .map_err(|source| Error::source_call("close", source))?;
        }
        Ok(())
    }

    /// Terminal transition after a failed row. The row error is already on its way to the caller,
    /// so the release here is best effort and a failure to close is only logged.
    fn abandon(&mut self) {
        self.has_row = false;
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(error) = cursor.close() {
                warn!("Error closing cursor after a failed row: {error}");
            }
        }
    }
}

impl<C> Drop for Scan<C>
where
    C: Cursor,
{
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(error) = cursor.close() {
                // Avoid panicking, if we already have a panic. We don't want to mask the
                // original error.
                if !panicking() {
                    panic!("Unexpected error closing cursor: {error:?}")
                }
            }
        }
    }
}

/// Iterates over the rows of a cursor, binding each row to a fresh instance of `T`.
///
/// The reader owns the cursor for its lifetime and closes it exactly once: after the last row
/// has been consumed, after a failed row, or then the reader is dropped early. Iteration is
/// single pass; iterating the result set again requires a new reader over a fresh cursor.
///
/// ```
/// use rowbind::{Bindable, Cursor, Error, Reader, Setter};
///
/// #[derive(Default)]
/// struct Call {
///     number: Option<String>,
///     date: i64,
/// }
///
/// impl Bindable for Call {
///     fn setters() -> Vec<Setter<Self>> {
///         vec![
///             Setter::text("setNumber", |call: &mut Call, value| call.number = Some(value)),
///             Setter::long_integer("setDate", |call: &mut Call, value| call.date = value),
///         ]
///     }
/// }
///
/// /// Prints every call in the log.
/// fn print_calls(cursor: impl Cursor) -> Result<(), Error> {
///     let calls = Reader::<_, Call>::new(cursor)?;
///     for call in calls {
///         let call = call?;
///         println!("Called {:?} at {}", call.number, call.date);
///     }
///     Ok(())
/// }
/// ```
pub struct Reader<C: Cursor, T> {
    scan: Scan<C>,
    plan: Arc<BindingPlan<T>>,
}

impl<C, T> Reader<C, T>
where
    C: Cursor,
    T: Bindable + Default,
{
    /// Creates a reader over an already open cursor, taking ownership of it. The binding plan is
    /// built directly; use [`Reader::with_registry`] to share plans across readers.
    pub fn new(cursor: C) -> Result<Self, Error> {
        let plan = Arc::new(BindingPlan::<T>::build(cursor.column_names()));
        Ok(Reader {
            scan: Scan::start(cursor)?,
            plan,
        })
    }

    /// Creates a reader over an already open cursor, obtaining the binding plan from `registry`
    /// so repeated readers for the same target type skip plan construction.
    pub fn with_registry(cursor: C, registry: &mut BindingRegistry) -> Result<Self, Error> {
        let plan = registry.plan_for::<T>(cursor.column_names());
        Ok(Reader {
            scan: Scan::start(cursor)?,
            plan,
        })
    }

    /// Executes `query` against the provider and reads the resulting cursor.
    pub fn query<P>(provider: &mut P, query: &P::Query) -> Result<Self, Error>
    where
        P: Provider<Cursor = C>,
    {
        let cursor = provider
            .query(query)
            .map_err(|source| Error::source_call("query", source))?;
        Self::new(cursor)
    }

    /// Executes `query` against the provider and reads the resulting cursor, obtaining the
    /// binding plan from `registry`.
    pub fn query_with_registry<P>(
        provider: &mut P,
        query: &P::Query,
        registry: &mut BindingRegistry,
    ) -> Result<Self, Error>
    where
        P: Provider<Cursor = C>,
    {
        let cursor = provider
            .query(query)
            .map_err(|source| Error::source_call("query", source))?;
        Self::with_registry(cursor, registry)
    }

    /// `true` if a row is positioned and not yet consumed. Pure query, callable repeatedly.
    /// Permanently `false` once the result set is exhausted or a row has failed.
    pub fn has_next(&self) -> bool {
        self.scan.has_row()
    }
}

impl<C, T> Iterator for Reader<C, T>
where
    C: Cursor,
    T: Bindable + Default,
{
    type Item = Result<T, Error>;

    /// Binds the current row to a fresh instance and advances the cursor. Yields an error item if
    /// a cursor call or a setter fails; the scan is then over and the cursor released, so the
    /// error is the final item.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.scan.has_row() {
            return None;
        }
        let result = match self.plan.bind_row(self.scan.cursor_mut()) {
            Ok(instance) => self.scan.advance().map(|()| instance),
            Err(error) => Err(error),
        };
        if result.is_err() {
            self.scan.abandon();
        }
        Some(result)
    }
}

/// Iterates over the rows of a cursor, resetting and refilling a single instance of `T` per row
/// instead of constructing a new one.
///
/// Use this over [`Reader`] to avoid allocation churn in tight scans over wide result sets. The
/// held instance is lent out per row, so the iteration protocol is an explicit loop instead of
/// [`Iterator`]; the borrow ends at the next call, which makes it impossible to accidentally
/// retain a row past the point where it is overwritten.
///
/// Before each row (except the first, where the instance is freshly constructed) the instance is
/// returned to a clean state via [`Resettable::reset`]. The reset must clear every bound field:
/// fields whose column is null in a row are not written, and an incomplete reset would leak the
/// previous rows value into such a field.
///
/// ```
/// use rowbind::{Bindable, Cursor, Error, Resettable, ReusingReader, Setter};
///
/// #[derive(Default)]
/// struct Reading {
///     value: f64,
/// }
///
/// impl Bindable for Reading {
///     fn setters() -> Vec<Setter<Self>> {
///         vec![Setter::double("setValue", |r: &mut Reading, v| r.value = v)]
///     }
/// }
///
/// impl Resettable for Reading {
///     fn reset(&mut self) {
///         self.value = 0.0;
///     }
/// }
///
/// /// Sums the value column without allocating per row.
/// fn sum_readings(cursor: impl Cursor) -> Result<f64, Error> {
///     let mut readings = ReusingReader::<_, Reading>::new(cursor)?;
///     let mut total = 0.0;
///     while let Some(reading) = readings.next_row()? {
///         total += reading.value;
///     }
///     Ok(total)
/// }
/// ```
pub struct ReusingReader<C: Cursor, T> {
    scan: Scan<C>,
    plan: Arc<BindingPlan<T>>,
    instance: T,
    /// `true` until the instance has received its first row; a fresh instance is already in a
    /// clean state, so the reset before the first row is skipped.
    fresh: bool,
}

impl<C, T> ReusingReader<C, T>
where
    C: Cursor,
    T: Bindable + Default + Resettable,
{
    /// Creates a reusing reader over an already open cursor, taking ownership of it.
    pub fn new(cursor: C) -> Result<Self, Error> {
        let plan = Arc::new(BindingPlan::<T>::build(cursor.column_names()));
        Self::from_parts(cursor, plan)
    }

    /// Creates a reusing reader over an already open cursor, obtaining the binding plan from
    /// `registry`.
    pub fn with_registry(cursor: C, registry: &mut BindingRegistry) -> Result<Self, Error> {
        let plan = registry.plan_for::<T>(cursor.column_names());
        Self::from_parts(cursor, plan)
    }

    /// Executes `query` against the provider and reads the resulting cursor.
    pub fn query<P>(provider: &mut P, query: &P::Query) -> Result<Self, Error>
    where
        P: Provider<Cursor = C>,
    {
        let cursor = provider
            .query(query)
            .map_err(|source| Error::source_call("query", source))?;
        Self::new(cursor)
    }

    /// Executes `query` against the provider and reads the resulting cursor, obtaining the
    /// binding plan from `registry`.
    pub fn query_with_registry<P>(
        provider: &mut P,
        query: &P::Query,
        registry: &mut BindingRegistry,
    ) -> Result<Self, Error>
    where
        P: Provider<Cursor = C>,
    {
        let cursor = provider
            .query(query)
            .map_err(|source| Error::source_call("query", source))?;
        Self::with_registry(cursor, registry)
    }

    fn from_parts(cursor: C, plan: Arc<BindingPlan<T>>) -> Result<Self, Error> {
        Ok(ReusingReader {
            scan: Scan::start(cursor)?,
            plan,
            instance: T::default(),
            fresh: true,
        })
    }

    /// `true` if a row is positioned and not yet consumed. Pure query, callable repeatedly.
    /// Permanently `false` once the result set is exhausted or a row has failed.
    pub fn has_next(&self) -> bool {
        self.scan.has_row()
    }

    /// Resets the held instance, fills it from the current row, advances the cursor and lends the
    /// instance out. `Ok(None)` once the result set is exhausted.
    pub fn next_row(&mut self) -> Result<Option<&T>, Error> {
        if !self.scan.has_row() {
            return Ok(None);
        }
        if self.fresh {
            self.fresh = false;
        } else {
            self.instance.reset();
        }
        let result = self
            .plan
            .apply_row(self.scan.cursor_mut(), &mut self.instance)
            .and_then(|()| self.scan.advance());
        if let Err(error) = result {
            self.scan.abandon();
            return Err(error);
        }
        Ok(Some(&self.instance))
    }

    /// Consumes the reader and hands out the held instance, i.e. the last row read. Releases the
    /// cursor if the result set was not exhausted yet.
    pub fn into_instance(self) -> T {
        self.instance
    }
}
