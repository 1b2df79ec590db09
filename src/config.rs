#[cfg(feature = "toml")]
use std::fs::read_to_string;
use std::{
    fs::File,
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    dispatch::{redact::RedactPolicy, Dispatcher, DEFAULT_TIMEOUT},
    error::{HookResult, InterfaceError},
    registry::{TemplateDraft, TemplateRegistry},
};

pub const ENV_BIND: &str = "HOOKTRIGGER_BIND";
pub const ENV_TIMEOUT: &str = "HOOKTRIGGER_TIMEOUT";

pub fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}
pub fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive_headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateDraft>,
}
impl Default for Config {
    fn default() -> Self {
        Self { bind: default_bind(), timeout: default_timeout(), sensitive_headers: Vec::new(), templates: Vec::new() }
    }
}

impl Config {
    pub fn read<A: AsRef<Path>>(path: A) -> HookResult<Self> {
        Format::from_path(path.as_ref())?.deserialize_config(path.as_ref())
    }
    pub fn read_str(s: &str, format: Format) -> HookResult<Self> {
        format.deserialize_config_str(s)
    }

    /// Overrides settings with `HOOKTRIGGER_*` environment variables.
    pub fn environment(self) -> HookResult<Self> {
        self.overridden(|key| std::env::var(key).ok())
    }
    pub fn overridden<F: Fn(&str) -> Option<String>>(self, env: F) -> HookResult<Self> {
        let bind = match env(ENV_BIND) {
            Some(v) => v.parse::<SocketAddr>().map_err(|_| InterfaceError::InvalidEnvironment(ENV_BIND.to_string(), v))?,
            None => self.bind,
        };
        let timeout = match env(ENV_TIMEOUT) {
            Some(v) => v.parse::<u64>().map_err(|_| InterfaceError::InvalidEnvironment(ENV_TIMEOUT.to_string(), v))?,
            None => self.timeout,
        };
        Ok(Self { bind, timeout, ..self })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
    pub fn redact_policy(&self) -> RedactPolicy {
        RedactPolicy::default().with_names(&self.sensitive_headers)
    }
    pub fn registry(&self) -> Arc<TemplateRegistry> {
        Arc::new(self.templates.iter().cloned().collect())
    }
    pub fn dispatcher<S>(&self, service: S) -> Dispatcher<S> {
        Dispatcher::with_timeout(service, self.timeout()).redact_policy(self.redact_policy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}
impl Format {
    pub fn from_path<A: AsRef<Path>>(path: A) -> HookResult<Self> {
        let basename = path.as_ref().extension().and_then(|ext| ext.to_str());
        match basename {
            Some("json") => Ok(Format::Json),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Ok(Format::Yaml),
            #[cfg(feature = "toml")]
            Some("toml") => Ok(Format::Toml),
            Some(ext) => Err(InterfaceError::UnknownFormatExtension(ext.to_string()))?,
            _ => Err(InterfaceError::CannotSpecifyFormat)?,
        }
    }

    pub fn deserialize_config<A: AsRef<Path>>(&self, path: A) -> HookResult<Config> {
        match self {
            Format::Json => Ok(serde_json::from_reader(File::open(path)?)?),
            #[cfg(feature = "yaml")]
            Format::Yaml => Ok(serde_yaml::from_reader(File::open(path)?)?),
            #[cfg(feature = "toml")]
            Format::Toml => Ok(toml::from_str(&read_to_string(path)?)?),
        }
    }

    pub fn deserialize_config_str(&self, content: &str) -> HookResult<Config> {
        match self {
            Format::Json => Ok(serde_json::from_str(content)?),
            #[cfg(feature = "yaml")]
            Format::Yaml => Ok(serde_yaml::from_str(content)?),
            #[cfg(feature = "toml")]
            Format::Toml => Ok(toml::from_str(content)?),
        }
    }
}
