use crate::descriptor::AttributeSet;

/// A kind of record served by the backend (`user`, `post`, ...).
///
/// Implementors are usually unit structs; the type parameter ties a
/// [`Model`](super::Model) and a [`DomainStore`](crate::store::DomainStore) to
/// one resource at compile time.
///
/// ```rust
/// use remodel::descriptor::{AttributeSet, Descriptor, TypeTag};
/// use remodel::model::Resource;
///
/// struct Tag;
///
/// impl Resource for Tag {
///     const MODEL_NAME: &'static str = "tag";
///
///     fn attributes() -> AttributeSet {
///         AttributeSet::base().with("label", Descriptor::new(TypeTag::String).required())
///     }
/// }
///
/// assert_eq!(Tag::attributes().len(), 4);
/// ```
pub trait Resource: Send + Sync + 'static {
    /// Singular resource name; pluralized for the endpoint path.
    const MODEL_NAME: &'static str;

    /// Attribute descriptors, keyed by camelCase name.
    fn attributes() -> AttributeSet {
        AttributeSet::base()
    }

    /// Keys sent by `serialize()`; `None` sends every key of the snapshot.
    fn serializable() -> Option<Vec<&'static str>> {
        None
    }
}
