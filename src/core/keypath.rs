//! Dot-separated key path resolution over nested context maps.

use serde_json::{Map, Value};

/// Resolve `path` (e.g. `header.X-Forwarded-For`) against a context map.
///
/// Every segment but the last must name a nested map. A missing segment and
/// a segment holding a non-map value both resolve to `None`; callers that
/// care about the type of the final value inspect it themselves.
pub fn resolve<'a>(path: &str, context: &'a Map<String, Value>) -> Option<&'a Value> {
    match path.split_once('.') {
        None => context.get(path),
        Some((head, rest)) => match context.get(head) {
            Some(Value::Object(nested)) => resolve(rest, nested),
            _ => None,
        },
    }
}
