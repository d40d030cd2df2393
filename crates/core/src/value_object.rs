//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// They are immutable: to "change" one, parse a new one. In this workspace a
/// value object can only be obtained through a validating constructor, so
/// holding one is proof that the wrapped value satisfied its contract.
///
/// ```ignore
/// let email = Email::parse("ivan@example.com")?;
/// assert_eq!(email, Email::parse("ivan@example.com")?);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {
    /// Raw representation as stored and displayed.
    fn as_str(&self) -> &str;
}
