//! Rendering of untracked resources

use anyhow::Result;
use clap::ValueEnum;
use reconcile::{LIST_KIND, Resource};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `apiVersion kind namespace name` line per resource
    Text,
    /// A single `List` document that can be fed back to kubectl
    Yaml,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListDocument<'a> {
    api_version: &'static str,
    kind: &'static str,
    items: &'a [&'a Resource],
}

/// Write `resources` to `out` in the requested format
pub fn render<W: Write>(format: OutputFormat, resources: &[&Resource], out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => render_text(resources, out),
        OutputFormat::Yaml => render_yaml(resources, out),
    }
}

fn render_text<W: Write>(resources: &[&Resource], out: &mut W) -> Result<()> {
    for resource in resources {
        writeln!(out, "{}", resource.id())?;
    }
    Ok(())
}

fn render_yaml<W: Write>(resources: &[&Resource], out: &mut W) -> Result<()> {
    let document = ListDocument {
        api_version: "v1",
        kind: LIST_KIND,
        items: resources,
    };
    serde_yaml::to_writer(out, &document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(format: OutputFormat, resources: &[&Resource]) -> String {
        let mut buf = Vec::new();
        render(format, resources, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text() {
        let deployment = Resource::new("apps/v1", "Deployment", "ns", "b");
        let namespace = Resource::new("v1", "Namespace", "", "ns");

        let text = rendered(OutputFormat::Text, &[&deployment, &namespace]);
        assert_eq!(text, "apps/v1 Deployment ns b\nv1 Namespace  ns\n");
    }

    #[test]
    fn test_text_empty() {
        assert_eq!(rendered(OutputFormat::Text, &[]), "");
    }

    #[test]
    fn test_yaml_is_a_list_document() {
        let deployment = Resource::new("apps/v1", "Deployment", "ns", "b");
        let config_map = Resource::new("v1", "ConfigMap", "ns", "a");

        let yaml = rendered(OutputFormat::Yaml, &[&deployment, &config_map]);
        assert!(yaml.contains("kind: List"));

        // The output is valid input for the normalizer
        let decoded = reconcile::decode_documents(yaml.as_bytes()).unwrap();
        assert_eq!(decoded, vec![deployment, config_map]);
    }

    #[test]
    fn test_yaml_empty() {
        let yaml = rendered(OutputFormat::Yaml, &[]);
        assert!(yaml.contains("items: []"));
        assert!(reconcile::decode_documents(yaml.as_bytes()).unwrap().is_empty());
    }
}
