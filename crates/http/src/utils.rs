//! Helper macros used across the crate.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Like `assert!`, except that a failed check becomes an error instead of a panic.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
