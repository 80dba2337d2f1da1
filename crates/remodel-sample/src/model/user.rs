use remodel::descriptor::{AttributeSet, Descriptor, TypeTag};
use remodel::model::Resource;

/// A registered user.
///
/// | Attribute | Type | Notes |
/// |-----------|------|-------|
/// | `name` | string | required |
/// | `email` | string | required |
/// | `role` | string | defaults to `"member"` |
/// | `favouriteFood` | array | optional |
pub struct User;

impl Resource for User {
    const MODEL_NAME: &'static str = "user";

    fn attributes() -> AttributeSet {
        AttributeSet::base()
            .with("name", Descriptor::new(TypeTag::String).required())
            .with("email", Descriptor::new(TypeTag::String).required())
            .with("role", Descriptor::new(TypeTag::String).with_default("member"))
            .with("favouriteFood", Descriptor::new(TypeTag::Array))
    }
}
