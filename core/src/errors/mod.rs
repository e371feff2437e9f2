mod runtime_error;

pub use runtime_error::RuntimeError;

/// Message of the `TypeError` raised when a promise is constructed without a
/// callable executor.
pub const INVALID_RESOLVER: &str = "Promise resolver undefined is not a function";

/// Message of the `TypeError` a promise is rejected with when it is resolved
/// with itself.
pub const CHAINING_CYCLE: &str = "Chaining cycle detected for promise #<Promise>";
