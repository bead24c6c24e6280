//! CLI configuration: named server contexts under `~/.wardrobe`.
//!
//! The config file lives next to the credential store so one directory
//! holds everything the CLI persists. Server resolution order for an
//! invocation: explicit `--server-url` flag, then the current context,
//! then the default.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api/";

/// Root directory for everything the CLI persists, shared with the
/// credential store.
pub fn wardrobe_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".wardrobe"))
}

/// One named server target.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerContext {
    pub server_url: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ServerContext>,
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(wardrobe_home()?.join("config.yaml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Malformed config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Could not write {}", path.display()))
    }

    /// Server URL for this invocation.
    pub fn resolve_server_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.current().map(|(_, ctx)| ctx.server_url.clone()))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn current(&self) -> Option<(&str, &ServerContext)> {
        let name = self.current_context.as_deref()?;
        self.contexts.get(name).map(|ctx| (name, ctx))
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current_context.as_deref() == Some(name)
    }

    /// Add or replace a context. The first context added becomes current;
    /// `make_current` forces the switch for later ones.
    pub fn add_context(&mut self, name: &str, server_url: String, make_current: bool) {
        self.contexts
            .insert(name.to_string(), ServerContext { server_url });
        if make_current || self.current_context.is_none() {
            self.current_context = Some(name.to_string());
        }
    }

    /// Switch to a named context; false when no such context exists.
    pub fn use_context(&mut self, name: &str) -> bool {
        if !self.contexts.contains_key(name) {
            return false;
        }
        self.current_context = Some(name.to_string());
        true
    }

    /// Remove a context; false when no such context exists. Deleting the
    /// current context leaves no context selected.
    pub fn delete_context(&mut self, name: &str) -> bool {
        if self.contexts.remove(name).is_none() {
            return false;
        }
        if self.current_context.as_deref() == Some(name) {
            self.current_context = None;
        }
        true
    }
}
