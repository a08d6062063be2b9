//! Helper macros shared by the pool and its backends.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Reads like `assert!`, but propagates an error instead of panicking.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
