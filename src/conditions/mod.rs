//! Built-in condition types.
//!
//! Combinators ([`AndSpec`], [`OrSpec`], [`NotSpec`]) own child conditions;
//! everything else is a leaf reading one value from the context.
//!
//! | type | payload |
//! |------|---------|
//! | `and`, `or` | `conditions: [..]` |
//! | `not` | `condition: {..}` |
//! | `equal` | `key`, `value` |
//! | `contains`, `substring` | `key`, `value` |
//! | `cidr` | `key`, `value` (CIDR range) |
//! | `regex` | `key`, `pattern`, `return` (optional `\1`-style template) |
//! | `time` | `key`, `layout`, `before`, `after` |
//! | `range` | `key`, `lower`, `upper` |
//! | `exists` | `key` |

mod cidr;
mod equal;
mod exists;
mod logical;
mod range;
mod regex;
mod substring;
mod time;

pub use self::cidr::CidrSpec;
pub use self::equal::EqualSpec;
pub use self::exists::ExistsSpec;
pub use self::logical::{AndSpec, NotSpec, OrSpec};
pub use self::range::RangeSpec;
pub use self::regex::RegexSpec;
pub use self::substring::SubstringSpec;
pub use self::time::TimeSpec;

use crate::core::{factory_of, SpecFactory};
use crate::{Error, Result};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Factories for every built-in condition type, keyed by discriminator.
pub fn builtin_conditions() -> Vec<(&'static str, SpecFactory)> {
    vec![
        ("and", factory_of::<AndSpec>()),
        ("or", factory_of::<OrSpec>()),
        ("not", factory_of::<NotSpec>()),
        ("equal", factory_of::<EqualSpec>()),
        ("contains", factory_of::<SubstringSpec>()),
        ("substring", factory_of::<SubstringSpec>()),
        ("cidr", factory_of::<CidrSpec>()),
        ("regex", factory_of::<RegexSpec>()),
        ("time", factory_of::<TimeSpec>()),
        ("range", factory_of::<RangeSpec>()),
        ("exists", factory_of::<ExistsSpec>()),
    ]
}

/// Register every built-in condition type in the process-wide registry.
pub fn register_builtin_conditions() {
    crate::core::register_conditions(builtin_conditions());
}

/// Decode a condition payload into its typed form.
pub(crate) fn decode_payload<T: DeserializeOwned>(kind: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| Error::invalid_spec(kind, e))
}

/// Reject leaves that were configured without a key.
pub(crate) fn require_key(kind: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_spec(kind, "key must be set"));
    }
    Ok(())
}

/// Error for a leaf evaluated before it was decoded.
pub(crate) fn not_decoded(kind: &str) -> Error {
    Error::internal(format!("{} condition evaluated before it was decoded", kind))
}
