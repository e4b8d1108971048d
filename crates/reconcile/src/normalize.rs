//! Stream normalization
//!
//! Turns one raw multi-document YAML stream into a flat, ordered list of
//! resources. `List` documents are unwrapped one level deep, and documents
//! that carry nothing (blank, comment-only, bare `---`) are dropped.

use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::source::Stream;
use serde::Deserialize;
use serde_yaml::Value;

/// Normalize a stream, tagging decode failures with its origin
pub fn normalize(stream: &Stream) -> Result<Vec<Resource>> {
    decode_documents(&stream.content).map_err(|source| Error::Decode {
        origin: stream.origin.clone(),
        source,
    })
}

/// Decode every document in `content`
///
/// The first document that fails to decode aborts the whole stream.
pub fn decode_documents(content: &[u8]) -> std::result::Result<Vec<Resource>, serde_yaml::Error> {
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_slice(content) {
        let value = Value::deserialize(document)?;
        // Separators and comment blocks decode to null
        if value.is_null() {
            continue;
        }

        let resource: Resource = serde_yaml::from_value(value)?;
        if resource.is_list() {
            // Nested lists stay as they are; Kubernetes never nests them
            resources.extend(resource.items.into_iter().filter(|item| !item.is_empty()));
        } else if !resource.is_empty() {
            resources.push(resource);
        }
    }

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(resources: &[Resource]) -> Vec<String> {
        resources.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_single_document_passes_through() {
        let mut resource = Resource::new("apps/v1", "Deployment", "ns", "web");
        resource.metadata.labels.insert("app".into(), "web".into());
        let yaml = serde_yaml::to_string(&resource).unwrap();

        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(decoded, vec![resource]);
    }

    #[test]
    fn test_only_separators_and_comments() {
        let yaml = "\n# nothing here\n---\n---\n\n# still nothing\n---\n";
        assert!(decode_documents(yaml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_documents(b"").unwrap().is_empty());
    }

    #[test]
    fn test_documents_keep_order() {
        let yaml = r"
# leading comment
apiVersion: v1
kind: ConfigMap
metadata:
  name: first
  namespace: ns
---
---
apiVersion: v1
kind: Secret
metadata:
  name: second
  namespace: ns
---
apiVersion: v1
kind: Namespace
metadata:
  name: ns
";
        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(
            ids(&decoded),
            vec![
                "v1 ConfigMap ns first",
                "v1 Secret ns second",
                "v1 Namespace  ns",
            ]
        );
    }

    #[test]
    fn test_list_is_flattened() {
        let yaml = r"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
      namespace: ns
  - apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: b
      namespace: ns
";
        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(
            decoded,
            vec![
                Resource::new("v1", "ConfigMap", "ns", "a"),
                Resource::new("apps/v1", "Deployment", "ns", "b"),
            ]
        );
    }

    #[test]
    fn test_empty_list_yields_nothing() {
        let yaml = "apiVersion: v1\nkind: List\nitems: []\n";
        assert!(decode_documents(yaml.as_bytes()).unwrap().is_empty());

        let yaml = "apiVersion: v1\nkind: List\n";
        assert!(decode_documents(yaml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_nested_list_is_not_expanded() {
        let yaml = r"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: List
    items:
      - apiVersion: v1
        kind: ConfigMap
        metadata:
          name: inner
";
        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].is_list());
        assert_eq!(decoded[0].items.len(), 1);
    }

    #[test]
    fn test_empty_list_items_are_dropped() {
        let yaml = r"
apiVersion: v1
kind: List
items:
  - {}
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
";
        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(ids(&decoded), vec!["v1 ConfigMap  a"]);
    }

    #[test]
    fn test_document_without_identity_is_dropped() {
        let yaml = "data:\n  key: value\n";
        assert!(decode_documents(yaml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_loose_metadata_values_decode() {
        let yaml = r"
apiVersion: v1
kind: ConfigMap
metadata:
  name: a
  namespace:
  labels:
    version: 2
  annotations:
    replicas: 3
    enabled: true
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: 2024
  namespace: ns
";
        let decoded = decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(ids(&decoded), vec!["v1 ConfigMap  a", "v1 ConfigMap ns 2024"]);
    }

    #[test]
    fn test_decode_error_is_fatal() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\n---\nkind: [unterminated\n";
        assert!(decode_documents(yaml.as_bytes()).is_err());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        // A scalar document is not a resource
        assert!(decode_documents(b"just a string\n").is_err());
        assert!(decode_documents(b"kind: [a, b]\n").is_err());
    }

    #[test]
    fn test_normalize_reports_origin() {
        let stream = Stream::new("manifests/broken.yaml", b"kind: [oops\n".to_vec());
        let err = normalize(&stream).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains("manifests/broken.yaml"));
    }
}
