//! Server rotation (spec §3 "Server set", §4.2 "smart rotation"): an
//! ordered, deduplicated list of upstream DoH servers behind a
//! `parking_lot::Mutex`, matching the lock the teacher uses for its own
//! shared mutable server-health state.

use parking_lot::Mutex;

use crate::error::{ConfigError, DnsError};

pub struct ServerSet {
    servers: Mutex<Vec<String>>,
    smart_rotate: bool,
}

impl ServerSet {
    pub fn new(servers: Vec<String>, smart_rotate: bool) -> Result<Self, DnsError> {
        let deduped = dedupe(servers);
        if deduped.is_empty() {
            return Err(ConfigError::MissingArgs("servers".to_string()).into());
        }
        Ok(Self {
            servers: Mutex::new(deduped),
            smart_rotate,
        })
    }

    pub fn get(&self) -> Vec<String> {
        self.servers.lock().clone()
    }

    /// Replaces the server list outright (spec §3's `setServers`).
    pub fn set(&self, servers: Vec<String>) -> Result<(), DnsError> {
        let deduped = dedupe(servers);
        if deduped.is_empty() {
            return Err(ConfigError::MissingArgs("servers".to_string()).into());
        }
        *self.servers.lock() = deduped;
        Ok(())
    }

    /// Called once a query exhausts every server and `server` was among
    /// the ones that failed: moves it to the tail so the next query tries
    /// healthier servers first. A no-op with fewer than two servers, or
    /// when smart rotation is disabled (spec §4.2 step 5).
    pub fn demote(&self, server: &str) {
        if !self.smart_rotate {
            return;
        }
        let mut servers = self.servers.lock();
        if servers.len() < 2 {
            return;
        }
        if let Some(pos) = servers.iter().position(|s| s == server) {
            let demoted = servers.remove(pos);
            servers.push(demoted);
        }
    }
}

fn dedupe(servers: Vec<String>) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    servers
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
