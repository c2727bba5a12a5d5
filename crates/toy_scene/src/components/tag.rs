use std::borrow::Cow;

use uuid::Uuid;

/// Display name of an entity. The uuid survives renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: Cow<'static, str>,
    pub uuid: Uuid,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
        }
    }
}
