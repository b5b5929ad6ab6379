use crate::model::{Id, text::TagName};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct TagMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Tag {
    pub id: Id<TagMarker>,
    pub name: TagName,
    pub description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreateTag {
    pub name: TagName,
    #[serde(default)]
    pub description: Option<String>,
}
