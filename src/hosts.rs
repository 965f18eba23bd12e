//! Hosts-file reader (spec §2's "Hosts file" external collaborator):
//! parsed once at `Resolver` construction, consulted before any network
//! query by `lookup()` and `reverse()`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

#[cfg(unix)]
const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";
#[cfg(windows)]
const DEFAULT_HOSTS_PATH: &str = r"C:\Windows\System32\drivers\etc\hosts";

#[derive(Debug, Clone, Default)]
pub struct HostsFile {
    /// Preserves file order: `lookup()`'s "first matching family" rule
    /// depends on which entry appears first.
    entries: Vec<(IpAddr, Vec<String>)>,
    by_name: HashMap<String, Vec<IpAddr>>,
}

impl HostsFile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load_default() -> Self {
        Self::load(Path::new(DEFAULT_HOSTS_PATH)).unwrap_or_default()
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut entries = Vec::new();
        let mut by_name: HashMap<String, Vec<IpAddr>> = HashMap::new();

        for line in contents.lines() {
            let line = match line.split('#').next() {
                Some(l) => l.trim(),
                None => continue,
            };
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(addr_str) = fields.next() else { continue };
            let Ok(addr) = addr_str.parse::<IpAddr>() else { continue };

            let names: Vec<String> = fields.map(|s| s.to_ascii_lowercase()).collect();
            if names.is_empty() {
                continue;
            }
            for name in &names {
                by_name.entry(name.clone()).or_default().push(addr);
            }
            entries.push((addr, names));
        }

        Self { entries, by_name }
    }

    /// Addresses for `name`, preserving file order, restricted to
    /// `family` (4 or 6) when given.
    pub fn addresses_for(&self, name: &str, family: Option<u8>) -> Vec<IpAddr> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .filter(|addr| match family {
                Some(4) => addr.is_ipv4(),
                Some(6) => addr.is_ipv6(),
                _ => true,
            })
            .copied()
            .collect()
    }

    /// The first name on file for `addr` (spec §4.6's `reverse()` hosts
    /// shortcut), matching the convention that the first column after the
    /// address is the canonical name.
    pub fn name_for(&self, addr: IpAddr) -> Option<String> {
        self.entries
            .iter()
            .find(|(a, _)| *a == addr)
            .and_then(|(_, names)| names.first().cloned())
    }
}
