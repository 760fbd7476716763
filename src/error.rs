use thiserror::Error;

/// Boxed error reported by a [`Cursor`](crate::Cursor) or [`Provider`](crate::Provider)
/// implementation. The crate forwards it unchanged as [`Error::Source`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Boxed error reported by a fallible setter. The crate forwards it as [`Error::Setter`].
pub type SetterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error surfaced while binding rows of a cursor to typed values.
#[derive(Debug, Error)]
pub enum Error {
    /// A cursor or provider call failed. `function` names the failing operation.
    #[error("cursor call `{function}` failed")]
    Source {
        /// The name of the cursor/provider operation that failed.
        function: &'static str,
        /// The error reported by the source.
        #[source]
        source: SourceError,
    },
    /// A setter rejected the value bound to it. `column` names the source column.
    #[error("setter for column `{column}` failed")]
    Setter {
        /// The name of the column whose setter failed.
        column: String,
        /// The error reported by the setter.
        #[source]
        source: SetterError,
    },
}

impl Error {
    /// Builds a [`Error::Source`] for a failed cursor/provider call named `function`.
    pub(crate) fn source_call(function: &'static str, source: SourceError) -> Self {
        Error::Source { function, source }
    }
}
