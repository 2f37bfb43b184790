use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form meta information.
pub type Meta = Map<String, Value>;

/// Links keyed by relation name (`self`, `related`, ...).
pub type Links = BTreeMap<String, Link>;

/// A link: serialised as a bare URL string unless it carries meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinkRepr", into = "LinkRepr")]
pub struct Link {
    pub href: String,
    pub meta: Option<Meta>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    HRef(String),
    Object {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Meta>,
    },
}

impl From<LinkRepr> for Link {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::HRef(href) => Link { href, meta: None },
            LinkRepr::Object { href, meta } => Link { href, meta },
        }
    }
}

impl From<Link> for LinkRepr {
    fn from(link: Link) -> Self {
        match link.meta {
            None => LinkRepr::HRef(link.href),
            Some(meta) => LinkRepr::Object {
                href: link.href,
                meta: Some(meta),
            },
        }
    }
}

/// The top-level `jsonapi` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonApiVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl JsonApiVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            meta: None,
        }
    }
}
