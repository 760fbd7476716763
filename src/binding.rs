use std::any::type_name;

use log::debug;

use crate::{
    cursor::Cursor,
    error::{Error, SetterError},
};

/// The value kinds a setter can accept and a cell can be read as.
///
/// This is a closed set. The order in [`ValueKind::PROBE_ORDER`] is the priority in which
/// candidate setters are probed for a column while building a [`BindingPlan`]; the first
/// registered setter matching both the synthesized name and the probed kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 32 bit integer, read with [`Cursor::get_int`].
    Integer,
    /// Text, read with [`Cursor::get_text`].
    Text,
    /// 64 bit integer, read with [`Cursor::get_long`].
    LongInteger,
    /// 32 bit float, read with [`Cursor::get_float`].
    Float,
    /// 64 bit float, read with [`Cursor::get_double`].
    Double,
}

impl ValueKind {
    /// Probe priority while matching setters to columns. Kept explicit so the "first compatible
    /// match wins" tie break is visible and testable rather than an accident of iteration order.
    pub const PROBE_ORDER: [ValueKind; 5] = [
        ValueKind::Integer,
        ValueKind::Text,
        ValueKind::LongInteger,
        ValueKind::Float,
        ValueKind::Double,
    ];
}

/// Synthesizes the setter name expected for a column: `set` followed by the column name with its
/// first character capitalized.
///
/// Capitalizing a character without an uppercase variant is a no op, so a leading underscore
/// stays as it is.
///
/// ```
/// use rowbind::setter_name;
///
/// assert_eq!("setNumber", setter_name("number"));
/// assert_eq!("set_id", setter_name("_id"));
/// ```
pub fn setter_name(column: &str) -> String {
    let mut chars = column.chars();
    match chars.next() {
        None => "set".to_string(),
        Some(first) => {
            let mut name = String::with_capacity(column.len() + 3);
            name.push_str("set");
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
            name
        }
    }
}

type ApplyFn<T, V> = Box<dyn Fn(&mut T, V) -> Result<(), SetterError> + Send + Sync>;

/// Typed application of a cell value to a target instance. One variant per [`ValueKind`].
enum Apply<T> {
    Integer(ApplyFn<T, i32>),
    Text(ApplyFn<T, String>),
    LongInteger(ApplyFn<T, i64>),
    Float(ApplyFn<T, f32>),
    Double(ApplyFn<T, f64>),
}

impl<T> Apply<T> {
    fn kind(&self) -> ValueKind {
        match self {
            Apply::Integer(_) => ValueKind::Integer,
            Apply::Text(_) => ValueKind::Text,
            Apply::LongInteger(_) => ValueKind::LongInteger,
            Apply::Float(_) => ValueKind::Float,
            Apply::Double(_) => ValueKind::Double,
        }
    }
}

/// One registered setter of a target type: a name, a value kind and the operation writing a value
/// of that kind into the target.
///
/// Created through the per kind constructors. The infallible constructors cover the common case
/// of plain field assignment; the `try_` constructors allow setters which validate or convert and
/// may fail, failing the row they occur in with [`Error::Setter`].
pub struct Setter<T> {
    name: String,
    apply: Apply<T>,
}

impl<T> Setter<T> {
    /// A setter accepting a 32 bit integer.
    pub fn integer<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, i32) + Send + Sync + 'static,
    {
        Self::try_integer(name, move |target, value| {
            set(target, value);
            Ok(())
        })
    }

    /// A setter accepting a 32 bit integer, which may fail.
    pub fn try_integer<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, i32) -> Result<(), SetterError> + Send + Sync + 'static,
    {
        Setter {
            name: name.into(),
            apply: Apply::Integer(Box::new(set)),
        }
    }

    /// A setter accepting text.
    pub fn text<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, String) + Send + Sync + 'static,
    {
        Self::try_text(name, move |target, value| {
            set(target, value);
            Ok(())
        })
    }

    /// A setter accepting text, which may fail.
    pub fn try_text<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, String) -> Result<(), SetterError> + Send + Sync + 'static,
    {
        Setter {
            name: name.into(),
            apply: Apply::Text(Box::new(set)),
        }
    }

    /// A setter accepting a 64 bit integer.
    pub fn long_integer<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, i64) + Send + Sync + 'static,
    {
        Self::try_long_integer(name, move |target, value| {
            set(target, value);
            Ok(())
        })
    }

    /// A setter accepting a 64 bit integer, which may fail.
    pub fn try_long_integer<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, i64) -> Result<(), SetterError> + Send + Sync + 'static,
    {
        Setter {
            name: name.into(),
            apply: Apply::LongInteger(Box::new(set)),
        }
    }

    /// A setter accepting a 32 bit float.
    pub fn float<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, f32) + Send + Sync + 'static,
    {
        Self::try_float(name, move |target, value| {
            set(target, value);
            Ok(())
        })
    }

    /// A setter accepting a 32 bit float, which may fail.
    pub fn try_float<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, f32) -> Result<(), SetterError> + Send + Sync + 'static,
    {
        Setter {
            name: name.into(),
            apply: Apply::Float(Box::new(set)),
        }
    }

    /// A setter accepting a 64 bit float.
    pub fn double<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, f64) + Send + Sync + 'static,
    {
        Self::try_double(name, move |target, value| {
            set(target, value);
            Ok(())
        })
    }

    /// A setter accepting a 64 bit float, which may fail.
    pub fn try_double<F>(name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&mut T, f64) -> Result<(), SetterError> + Send + Sync + 'static,
    {
        Setter {
            name: name.into(),
            apply: Apply::Double(Box::new(set)),
        }
    }

    /// The name columns are matched against, e.g. `setNumber`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value kind this setter accepts.
    pub fn kind(&self) -> ValueKind {
        self.apply.kind()
    }
}

/// Target types declare their settable fields by implementing this trait.
///
/// [`Setter`] names follow the convention `set` + capitalized column name: a type wishing to
/// receive the `number` column registers a setter named `setNumber`, one wishing to receive the
/// `_id` column registers `set_id`. Columns without a matching setter are silently skipped — a
/// type may intentionally bind only a subset of a result set.
///
/// If several registered setters share a name, [`ValueKind::PROBE_ORDER`] decides across kinds
/// and registration order decides within a kind. Since each column is matched independently, two
/// columns synthesizing the same setter name both bind that setter; column names are assumed
/// unique by the cursor contract, so this crate does not guard against it.
///
/// ```
/// use rowbind::{Bindable, Setter};
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
/// ```
pub trait Bindable: Sized + 'static {
    /// The setters of this type. Called once per binding plan construction, not once per row.
    fn setters() -> Vec<Setter<Self>>;
}

/// Dispatch table from column position to typed setter, built once per target type and column
/// set, then reused for every row.
///
/// Construction is the expensive part (name synthesis and probing over the registration list);
/// applying a plan is a couple of indexed lookups per column. [`crate::BindingRegistry`] caches
/// plans across readers so the construction cost is paid once per target type.
pub struct BindingPlan<T> {
    columns: Vec<String>,
    setters: Vec<Setter<T>>,
    /// One entry per column position: index into `setters`, or `None` if the column has no
    /// matching setter and its cells are ignored.
    entries: Vec<Option<usize>>,
}

impl<T> BindingPlan<T>
where
    T: Bindable,
{
    /// Builds the plan for target type `T` against the given column set.
    ///
    /// For every column the expected setter name is synthesized (see [`setter_name`]) and the
    /// registered setters of `T` are probed in [`ValueKind::PROBE_ORDER`]; the first match wins.
    /// Columns without a match get an empty entry.
    pub fn build(column_names: &[String]) -> Self {
        let setters = T::setters();
        let entries: Vec<Option<usize>> = column_names
            .iter()
            .map(|column| {
                let name = setter_name(column);
                ValueKind::PROBE_ORDER.iter().find_map(|&kind| {
                    setters
                        .iter()
                        .position(|setter| setter.kind() == kind && setter.name() == name)
                })
            })
            .collect();
        let plan = BindingPlan {
            columns: column_names.to_vec(),
            setters,
            entries,
        };
        debug!(
            "Built binding plan for `{}`: {} of {} columns bound.",
            type_name::<T>(),
            plan.bound_columns(),
            plan.columns.len()
        );
        plan
    }

    /// The column names this plan has been built from, in column order. A plan must only be
    /// applied to cursors with exactly this column set.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns with a matching setter.
    pub fn bound_columns(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Applies the current row of the cursor to `target`.
    ///
    /// For each column with a matching setter whose cell is not null, the cell is read with the
    /// getter of the setters value kind and passed to the setter. Null cells and unmatched
    /// columns leave the corresponding field at whatever value it already had. The cursor is not
    /// advanced.
    pub fn apply_row<C>(&self, cursor: &mut C, target: &mut T) -> Result<(), Error>
    where
        C: Cursor,
    {
        for (index, entry) in self.entries.iter().copied().enumerate() {
            let Some(setter) = entry.map(|i| &self.setters[i]) else {
                continue;
            };
            if cursor
                .is_null(index)
                .map_err(|source| Error::source_call("is_null", source))?
            {
                continue;
            }
            let applied = match &setter.apply {
                Apply::Integer(set) => {
                    let value = cursor
                        .get_int(index)
                        .map_err(|source| Error::source_call("get_int", source))?;
                    set(target, value)
                }
                Apply::Text(set) => {
                    let value = cursor
                        .get_text(index)
                        .map_err(|source| Error::source_call("get_text", source))?;
                    set(target, value)
                }
                Apply::LongInteger(set) => {
                    let value = cursor
                        .get_long(index)
                        .map_err(|source| Error::source_call("get_long", source))?;
                    set(target, value)
                }
                Apply::Float(set) => {
                    let value = cursor
                        .get_float(index)
                        .map_err(|source| Error::source_call("get_float", source))?;
                    set(target, value)
                }
                Apply::Double(set) => {
                    let value = cursor
                        .get_double(index)
                        .map_err(|source| Error::source_call("get_double", source))?;
                    set(target, value)
                }
            };
            applied.map_err(|source| Error::Setter {
                column: self.columns[index].clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Constructs a fresh instance and fills it from the current row of the cursor, without
    /// advancing it. Useful for cursors positioned by other means than the readers of this crate.
    pub fn bind_row<C>(&self, cursor: &mut C) -> Result<T, Error>
    where
        C: Cursor,
        T: Default,
    {
        let mut instance = T::default();
        self.apply_row(cursor, &mut instance)?;
        Ok(instance)
    }
}
