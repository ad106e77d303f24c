//! Configuration loading
//!
//! Parses the YAML template list and validates it before anything touches
//! the network. The engine itself never reads files; it receives the
//! validated spec list from here.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use vmforge_core::domain::template::{SourceSpec, TargetSpec, TemplateSpec};
use vmforge_engine::image::ProviderRegistry;

/// On-disk shape of the configuration file:
///
/// ```yaml
/// templates:
///   debian-12:
///     source:
///       distribution: debian
///       architecture: amd64
///       version: "12"
///       variant: genericcloud
///       base_template: Debian Bookworm 12
///     target:
///       name: debian-12
///       cpu: 1
///       memory_gib: 1
///       network: net-A
///       sr: sr-A
/// ```
#[derive(Debug, Deserialize)]
struct TemplateListFile {
    templates: BTreeMap<String, TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    source: SourceSpec,
    target: TargetSpec,
}

/// Load and validate the template list.
pub fn load_templates(path: &Path) -> Result<Vec<TemplateSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: TemplateListFile =
        serde_yaml::from_str(&raw).context("configuration file is not valid YAML")?;

    let registry = ProviderRegistry::builtin();
    let mut specs = Vec::new();
    let mut names = HashSet::new();

    for (key, entry) in file.templates {
        let spec = TemplateSpec {
            source: entry.source,
            target: entry.target,
        };
        validate(&key, &spec, &registry)?;

        if !names.insert(spec.target.name.clone()) {
            bail!(
                "template '{}': duplicate target name '{}'",
                key,
                spec.target.name
            );
        }
        specs.push(spec);
    }

    Ok(specs)
}

fn validate(key: &str, spec: &TemplateSpec, registry: &ProviderRegistry) -> Result<()> {
    if registry.get(&spec.source.distribution).is_none() {
        bail!(
            "template '{}': unsupported distribution '{}' (supported: {})",
            key,
            spec.source.distribution,
            registry.distributions().join(", ")
        );
    }
    if spec.target.name.is_empty() {
        bail!("template '{}': target name must not be empty", key);
    }
    if spec.target.cpu < 1 {
        bail!("template '{}': cpu must be at least 1", key);
    }
    if spec.target.memory_gib < 1 {
        bail!("template '{}': memory_gib must be at least 1", key);
    }
    if spec.target.network.is_empty() {
        bail!("template '{}': network must not be empty", key);
    }
    if spec.target.sr.is_empty() {
        bail!("template '{}': sr must not be empty", key);
    }
    if spec.source.base_template.is_empty() {
        bail!("template '{}': base_template must not be empty", key);
    }
    Ok(())
}
