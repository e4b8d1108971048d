use anyhow::{Context, Result, bail};
use reconcile::{BoxedSource, CommandSource, CommandSpec, ExclusionPolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}

// ============================================================================
// untrak.yaml
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UntrakConfig {
    /// Extra commands whose output counts as declared
    #[serde(default, rename = "in")]
    pub declared: Vec<CommandConfig>,

    /// Commands that report what actually runs
    #[serde(default, rename = "out")]
    pub observed: Vec<CommandConfig>,

    /// Kinds never reported as untracked
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, relative to the config file
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Deadline in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl UntrakConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.resolve_dirs(base);
        }
        Ok(config)
    }

    /// Parse and validate config content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.observed.is_empty() {
            bail!("no 'out' commands configured");
        }
        for command in self.declared.iter().chain(&self.observed) {
            if command.cmd.trim().is_empty() {
                bail!("command with an empty 'cmd'");
            }
            if command.timeout == Some(0) {
                bail!("command '{}' has a zero timeout", command.cmd);
            }
        }
        if self.exclude.iter().any(|kind| kind.trim().is_empty()) {
            bail!("empty kind in 'exclude'");
        }
        Ok(())
    }

    fn resolve_dirs(&mut self, base: &Path) {
        for command in self.declared.iter_mut().chain(self.observed.iter_mut()) {
            if let Some(dir) = command.dir.as_mut().filter(|dir| dir.is_relative()) {
                *dir = base.join(&*dir);
            }
        }
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(&self.exclude)
    }

    pub fn declared_sources(&self) -> Vec<BoxedSource> {
        to_sources(&self.declared)
    }

    pub fn observed_sources(&self) -> Vec<BoxedSource> {
        to_sources(&self.observed)
    }
}

impl CommandConfig {
    pub fn to_spec(&self) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.cmd, &self.args);
        if let Some(dir) = &self.dir {
            spec = spec.with_workdir(dir);
        }
        if let Some(secs) = self.timeout {
            spec = spec.with_timeout(Duration::from_secs(secs));
        }
        spec
    }
}

fn to_sources(commands: &[CommandConfig]) -> Vec<BoxedSource> {
    commands
        .iter()
        .map(|command| Box::new(CommandSource::new(command.to_spec())) as BoxedSource)
        .collect()
}
