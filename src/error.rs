//! Fatal-error marker for exit-code mapping.

/// Marker for unrecoverable failures: embedding-model load errors and store
/// corruption. The CLI maps any error chain containing this type to exit
/// code 2; all other errors are recoverable (exit code 1).
#[derive(Debug)]
pub struct FatalError(pub String);

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FatalError {}

/// `true` if any cause in the chain is a [`FatalError`].
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<FatalError>().is_some())
}
