//! State key and event name composition.
//!
//! Two key encodings are supported. Composite keys use the ledger layout:
//! a NUL namespace marker, then the object type and every attribute, each
//! followed by NUL. Plain keys join the same parts with `/`, which keeps
//! them readable in local state dumps.

use crate::error::ContextError;

const COMPOSITE_NAMESPACE: char = '\u{0}';
const COMPOSITE_SEPARATOR: char = '\u{0}';
const MAX_CODE_POINT: char = char::MAX;

/// Separator between the parts of a plain key.
pub const KEY_SEPARATOR: char = '/';

/// Separator between the application and event parts of an event name.
pub const EVENT_SEPARATOR: char = '.';

/// Builds a NUL-separated composite key.
///
/// # Errors
///
/// Returns [`ContextError::InvalidCodePoint`] when the object type or an
/// attribute contains U+0000 or U+10FFFF.
///
/// # Example
///
/// ```
/// use coral_rpc::context::keys::{create_composite_key, split_composite_key};
///
/// let key = create_composite_key("Account", &["alice", "savings"]).unwrap();
/// assert_eq!(key, "\u{0}Account\u{0}alice\u{0}savings\u{0}");
/// let (object_type, attributes) = split_composite_key(&key).unwrap();
/// assert_eq!(object_type, "Account");
/// assert_eq!(attributes, ["alice", "savings"]);
/// ```
pub fn create_composite_key<S: AsRef<str>>(
    object_type: &str,
    attributes: &[S],
) -> Result<String, ContextError> {
    validate_composite_part(object_type)?;
    let mut key = String::new();
    key.push(COMPOSITE_NAMESPACE);
    key.push_str(object_type);
    key.push(COMPOSITE_SEPARATOR);
    for attribute in attributes {
        let attribute = attribute.as_ref();
        validate_composite_part(attribute)?;
        key.push_str(attribute);
        key.push(COMPOSITE_SEPARATOR);
    }
    Ok(key)
}

/// Splits a composite key into its object type and attributes.
///
/// # Errors
///
/// Returns [`ContextError::NotComposite`] when `key` lacks the namespace
/// marker or the trailing separator.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), ContextError> {
    let not_composite = || ContextError::NotComposite {
        key: key.to_owned(),
    };
    let body = key
        .strip_prefix(COMPOSITE_NAMESPACE)
        .and_then(|rest| rest.strip_suffix(COMPOSITE_SEPARATOR))
        .ok_or_else(not_composite)?;
    let mut parts = body.split(COMPOSITE_SEPARATOR).map(str::to_owned);
    let object_type = parts.next().ok_or_else(not_composite)?;
    Ok((object_type, parts.collect()))
}

fn validate_composite_part(part: &str) -> Result<(), ContextError> {
    match part
        .char_indices()
        .find(|(_, ch)| *ch == COMPOSITE_SEPARATOR || *ch == MAX_CODE_POINT)
    {
        Some((position, code_point)) => Err(ContextError::InvalidCodePoint {
            code_point,
            position,
        }),
        None => Ok(()),
    }
}

/// Builds a `/`-joined plain key.
///
/// # Errors
///
/// Returns [`ContextError::Delimiter`] when the object type or an attribute
/// contains `/`.
///
/// # Example
///
/// ```
/// use coral_rpc::context::keys::{create_key, split_key};
///
/// let key = create_key("Counter", &["apples"]).unwrap();
/// assert_eq!(key, "Counter/apples");
/// assert_eq!(split_key(&key), ("Counter".to_owned(), vec!["apples".to_owned()]));
/// assert!(create_key("Counter", &["a/b"]).is_err());
/// ```
pub fn create_key<S: AsRef<str>>(
    object_type: &str,
    attributes: &[S],
) -> Result<String, ContextError> {
    let parts: Vec<&str> = std::iter::once(object_type)
        .chain(attributes.iter().map(AsRef::as_ref))
        .collect();
    if let Some(part) = parts.iter().find(|part| part.contains(KEY_SEPARATOR)) {
        return Err(ContextError::Delimiter {
            part: (*part).to_owned(),
        });
    }
    let mut key = String::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(part);
    }
    Ok(key)
}

/// Splits a plain key into its object type and attributes.
#[must_use]
pub fn split_key(key: &str) -> (String, Vec<String>) {
    let mut parts = key.split(KEY_SEPARATOR).map(str::to_owned);
    let object_type = parts.next().unwrap_or_default();
    (object_type, parts.collect())
}

/// Joins an application name and an event name as `app.event`.
///
/// # Errors
///
/// Returns [`ContextError::EventName`] when either part is empty or the
/// application name contains the separator.
///
/// # Example
///
/// ```
/// use coral_rpc::context::keys::make_event_name;
///
/// assert_eq!(make_event_name("hello", "Greeted").unwrap(), "hello.Greeted");
/// assert!(make_event_name("", "Greeted").is_err());
/// ```
pub fn make_event_name(app: &str, event: &str) -> Result<String, ContextError> {
    if app.is_empty() || event.is_empty() || app.contains(EVENT_SEPARATOR) {
        return Err(ContextError::EventName {
            app: app.to_owned(),
            event: event.to_owned(),
        });
    }
    Ok(format!("{app}{EVENT_SEPARATOR}{event}"))
}
