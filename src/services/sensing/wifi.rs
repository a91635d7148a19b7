//! Wi-Fi network scanners

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use sensing_cascade_core::{CoreError, CoreResult, MemoryPressure, NetworkScanner};

/// Lists SSIDs through NetworkManager's `nmcli`, caching results briefly
pub struct CommandWifiScanner {
    command: String,
    ttl: Duration,
    cache: Mutex<Option<(Instant, Vec<String>)>>,
}

impl CommandWifiScanner {
    pub fn new(command: impl Into<String>, ttl: Duration) -> Self {
        Self {
            command: command.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<Vec<String>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match &*cache {
            Some((at, networks)) if at.elapsed() < self.ttl => Some(networks.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl NetworkScanner for CommandWifiScanner {
    async fn scan(&self) -> CoreResult<Vec<String>> {
        if let Some(networks) = self.cached() {
            debug!(count = networks.len(), "Using cached network scan");
            return Ok(networks);
        }

        let output = Command::new(&self.command)
            .args(["-t", "-f", "SSID", "dev", "wifi", "list"])
            .output()
            .await
            .map_err(|e| CoreError::source(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::source(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let networks = parse_ssid_list(&String::from_utf8_lossy(&output.stdout));
        debug!(count = networks.len(), "Network scan finished");
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = Some((Instant::now(), networks.clone()));
        Ok(networks)
    }

    fn trim_caches(&self, level: MemoryPressure) {
        if self.cache.lock().unwrap_or_else(PoisonError::into_inner).take().is_some() {
            info!(?level, "Dropped cached network scan");
        }
    }
}

/// Parse `nmcli -t -f SSID` output: one SSID per line, `\:` escaped, hidden
/// networks blank or `--`. Duplicates keep their first position.
pub fn parse_ssid_list(output: &str) -> Vec<String> {
    let mut networks: Vec<String> = Vec::new();
    for line in output.lines() {
        let ssid = line.trim().replace("\\:", ":");
        if ssid.is_empty() || ssid == "--" || networks.contains(&ssid) {
            continue;
        }
        networks.push(ssid);
    }
    networks
}

/// Fixed network list, for hosts without a wireless interface
pub struct StaticNetworkScanner {
    networks: Vec<String>,
}

impl StaticNetworkScanner {
    pub fn new(networks: Vec<String>) -> Self {
        Self { networks }
    }
}

#[async_trait]
impl NetworkScanner for StaticNetworkScanner {
    async fn scan(&self) -> CoreResult<Vec<String>> {
        Ok(self.networks.clone())
    }
}
