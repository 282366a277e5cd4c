//! Keeping the signing key out of logs.
//!
//! Wrap the private key in [`Redacted`] wherever it might reach `Debug` or
//! `Display` output (config dumps, tracing fields, error reports).

use std::fmt::{self, Debug, Display};

/// Formats as `<redacted>` regardless of the wrapped value
///
/// ```
/// use deployer::redact::Redacted;
///
/// let key = "0x1f84c95ac16e6a50f08d44c7bde7aff8742212fda6e4321fde48bf83bef266dc";
/// assert_eq!(format!("{}", Redacted(key)), "<redacted>");
/// ```
#[derive(Clone, Copy)]
pub struct Redacted<T>(pub T);

impl<T> Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
