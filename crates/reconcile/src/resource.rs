//! Resource model and identity
//!
//! A [`Resource`] is the narrowed view of one manifest object: enough to know
//! what it is and where it lives. Everything else in the document is dropped
//! at decode time, apart from labels and annotations which are kept for
//! display only. Identity fields read any scalar as text and null as empty,
//! so loosely typed manifests still decode.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Kind of the container documents whose `items` are expanded
pub const LIST_KIND: &str = "List";

/// Object metadata consulted by untrak
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,

    /// Empty for cluster-scoped objects
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub namespace: String,

    /// Display only, any YAML values accepted
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Mapping::is_empty"
    )]
    pub labels: Mapping,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Mapping::is_empty"
    )]
    pub annotations: Mapping,
}

/// One declarative object, as found in a manifest or a command's output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub api_version: String,

    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub kind: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,

    /// Only meaningful when `kind` is [`LIST_KIND`]
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<Resource>,
}

/// Read a scalar as text; null becomes the empty string
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Sequence(_) => Err(de::Error::custom("expected a scalar, found a sequence")),
        Value::Mapping(_) => Err(de::Error::custom("expected a scalar, found a mapping")),
        Value::Tagged(tagged) => Err(de::Error::custom(format!(
            "expected a scalar, found tagged value {}",
            tagged.tag
        ))),
    }
}

/// An explicit null reads the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Resource {
    /// Build a resource from its identity fields
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: Metadata {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Identity key used to match the same object across sources
    pub fn id(&self) -> ResourceId {
        ResourceId {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            namespace: self.metadata.namespace.clone(),
            name: self.metadata.name.clone(),
        }
    }

    /// True for documents that carry no object at all
    ///
    /// Blank documents, comment blocks and bare separators decode to this.
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty() && self.api_version.is_empty() && self.metadata.name.is_empty()
    }

    /// True for container documents whose `items` hold the real objects
    pub fn is_list(&self) -> bool {
        self.kind == LIST_KIND
    }
}

/// Identity of a resource: `(apiVersion, kind, namespace, name)`
///
/// Comparison is exact and case-sensitive on every component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.api_version, self.kind, self.namespace, self.name
        )
    }
}
