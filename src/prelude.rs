/*!
Common imports for error handling across the crate.
*/

pub use snafu::{ensure, OptionExt, ResultExt, Snafu};
