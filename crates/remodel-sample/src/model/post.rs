use remodel::descriptor::{AttributeSet, Descriptor, TypeTag};
use remodel::model::Resource;
use serde_json::json;

/// A blog post written by a [`User`](super::User).
///
/// Timestamps are server-owned, so they are left out of the payload.
pub struct Post;

impl Resource for Post {
    const MODEL_NAME: &'static str = "post";

    fn attributes() -> AttributeSet {
        AttributeSet::base()
            .with("title", Descriptor::new(TypeTag::String).required())
            .with("body", Descriptor::new(TypeTag::String).accepting([TypeTag::Null]))
            .with("userId", Descriptor::new(TypeTag::Number).required())
            .with("published", Descriptor::new(TypeTag::Boolean).with_default(false))
            .with("tags", Descriptor::new(TypeTag::Array).with_default(json!([])))
    }

    fn serializable() -> Option<Vec<&'static str>> {
        Some(vec!["id", "title", "body", "userId", "published", "tags"])
    }
}
