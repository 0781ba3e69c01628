use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tsetlink_core::types::{ComputeResource, Value};

pub const PORT_VAR: &str = "T2_PORT";
pub const BOOTSTRAP_VAR: &str = "T2_BOOTSTRAP";
pub const HOST_VAR: &str = "T2_HOST";

/// Where the gateway listens and which leg of the job this process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub host: IpAddr,
    pub port: u16,
    /// `true` for the one-shot submission leg.
    pub bootstrap: bool,
}

impl GatewaySettings {
    pub fn new(port: u16) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            bootstrap: false,
        }
    }

    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the settings through `lookup`, which maps a variable name to its
    /// value. `T2_PORT` is required; the bootstrap flag is set only by the
    /// literal value `true`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup(PORT_VAR).ok_or_else(|| anyhow!("{} is not set", PORT_VAR))?;
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid port: {:?}", PORT_VAR, port))?;

        let bootstrap = lookup(BOOTSTRAP_VAR).is_some_and(|v| v == "true");

        let host = match lookup(HOST_VAR) {
            Some(host) => host
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid address: {:?}", HOST_VAR, host))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        Ok(Self {
            host,
            port,
            bootstrap,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// What the submission leg pushes to the engine before committing.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentOptions {
    pub name: Option<String>,
    /// Configuration overrides, forwarded in insertion order.
    pub config: Vec<(String, Value)>,
    pub resources: Vec<ComputeResource>,
    /// Pause between commit and closing the connection.
    pub submit_grace: Duration,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            name: None,
            config: Vec::new(),
            resources: Vec::new(),
            submit_grace: Duration::from_secs(5),
        }
    }
}

impl EnvironmentOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.push((key.into(), value.into()));
        self
    }

    pub fn with_resource(mut self, cpu: f64, ram_mb: u32, instances: u32) -> Self {
        self.resources
            .push(ComputeResource::new(cpu, ram_mb, instances));
        self
    }

    pub fn with_submit_grace(mut self, grace: Duration) -> Self {
        self.submit_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings =
            GatewaySettings::from_lookup(lookup(&[("T2_PORT", "25333"), ("T2_BOOTSTRAP", "true")]))
                .unwrap();
        assert_eq!(settings.port, 25333);
        assert!(settings.bootstrap);
        assert_eq!(settings.addr().to_string(), "127.0.0.1:25333");
    }

    #[test]
    fn test_bootstrap_requires_literal_true() {
        for value in ["TRUE", "1", "yes", ""] {
            let settings =
                GatewaySettings::from_lookup(lookup(&[("T2_PORT", "1"), ("T2_BOOTSTRAP", value)]))
                    .unwrap();
            assert!(!settings.bootstrap, "{value:?} must not enable bootstrap");
        }
        let settings = GatewaySettings::from_lookup(lookup(&[("T2_PORT", "1")])).unwrap();
        assert!(!settings.bootstrap);
    }

    #[test]
    fn test_missing_or_invalid_port() {
        let err = GatewaySettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("T2_PORT is not set"));

        let err = GatewaySettings::from_lookup(lookup(&[("T2_PORT", "70000")])).unwrap_err();
        assert!(err.to_string().contains("not a valid port"));
    }

    #[test]
    fn test_host_override() {
        let settings =
            GatewaySettings::from_lookup(lookup(&[("T2_PORT", "9"), ("T2_HOST", "10.0.0.7")]))
                .unwrap();
        assert_eq!(settings.addr().to_string(), "10.0.0.7:9");
    }

    #[test]
    fn test_options_builder_keeps_order() {
        let options = EnvironmentOptions::named("kmeans")
            .with_config("b", 2)
            .with_config("a", 1)
            .with_resource(1.0, 512, 2);
        assert_eq!(options.name.as_deref(), Some("kmeans"));
        assert_eq!(options.config[0].0, "b");
        assert_eq!(options.config[1].0, "a");
        assert_eq!(options.resources, vec![ComputeResource::new(1.0, 512, 2)]);
        assert_eq!(options.submit_grace, Duration::from_secs(5));
    }
}
