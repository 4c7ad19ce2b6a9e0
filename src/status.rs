//! Status Codes
//!
//! Every exported primitive returns a plain `i32`. Zero and negative values
//! produced by a primitive are passed through untouched; the bridge adds two
//! codes of its own that no primitive ever returns.

/// The primitive succeeded
pub const SUCCESS: i32 = 0;

/// The primitive reported a failure (bad input, verification failure, ...)
pub const FAILURE: i32 = -1;

/// A required buffer was absent and the absent-buffer policy is `reject`
pub const ABSENT_REQUIRED: i32 = -2;

/// The managed environment failed while marshalling; the call did not run
pub const ENVIRONMENT_FAILURE: i32 = i32::MIN;
