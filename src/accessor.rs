// Typed traversal over untyped post JSON

use serde_json::Value;

/// One step along a path into a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Descend into an object by key.
    Key(&'static str),
    /// Descend into an array by position.
    Index(usize),
}

/// Follows `steps` from `value`, returning the node at the end of the path.
///
/// Any missing key, out-of-range index, or type mismatch along the way
/// yields `None` instead of panicking.
pub fn walk<'a>(value: &'a Value, steps: &[Step]) -> Option<&'a Value> {
    let mut current = value;
    for step in steps {
        current = match step {
            Step::Key(key) => current.get(key)?,
            Step::Index(idx) => current.get(idx)?,
        };
    }
    Some(current)
}

/// Tries each path in order and returns the first non-empty string leaf.
/// An empty or non-string leaf falls through to the next path.
pub fn first_str<'a>(value: &'a Value, paths: &[&[Step]]) -> Option<&'a str> {
    paths
        .iter()
        .find_map(|path| walk_str(value, path).filter(|leaf| !leaf.is_empty()))
}

/// Walks to a string leaf, returning it borrowed.
pub fn walk_str<'a>(value: &'a Value, steps: &[Step]) -> Option<&'a str> {
    walk(value, steps).and_then(Value::as_str)
}
