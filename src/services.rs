//! Static service-name/port table (spec §2's "Service DB" external
//! collaborator), used by `lookupService()` to turn a port number back
//! into the name IANA registers for it (e.g. 80 -> "http").

/// `(port, tcp_name, udp_name)`. Covers the small set of well-known ports
/// `lookupService()` is actually exercised against; not a full IANA
/// mirror.
const SERVICES: &[(u16, &str, &str)] = &[
    (7, "echo", "echo"),
    (20, "ftp-data", "ftp-data"),
    (21, "ftp", "ftp"),
    (22, "ssh", "ssh"),
    (23, "telnet", "telnet"),
    (25, "smtp", "smtp"),
    (43, "whois", "whois"),
    (53, "domain", "domain"),
    (67, "bootps", "bootps"),
    (68, "bootpc", "bootpc"),
    (69, "tftp", "tftp"),
    (80, "http", "http"),
    (110, "pop3", "pop3"),
    (119, "nntp", "nntp"),
    (123, "ntp", "ntp"),
    (143, "imap", "imap"),
    (161, "snmp", "snmp"),
    (194, "irc", "irc"),
    (389, "ldap", "ldap"),
    (443, "https", "https"),
    (445, "microsoft-ds", "microsoft-ds"),
    (465, "submissions", "submissions"),
    (514, "syslog", "syslog"),
    (587, "submission", "submission"),
    (636, "ldaps", "ldaps"),
    (993, "imaps", "imaps"),
    (995, "pop3s", "pop3s"),
    (3306, "mysql", "mysql"),
    (5432, "postgresql", "postgresql"),
    (6379, "redis", "redis"),
    (8080, "http-alt", "http-alt"),
];

/// Looks up the registered name for `port` over `protocol` ("tcp" or
/// "udp"), falling back to the bare port number when unknown, matching a
/// platform resolver's `getnameinfo()` behavior.
pub fn name_for_port(port: u16, protocol: &str) -> String {
    for &(p, tcp_name, udp_name) in SERVICES {
        if p == port {
            return match protocol {
                "udp" => udp_name.to_string(),
                _ => tcp_name.to_string(),
            };
        }
    }
    port.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tcp_port_resolves_by_name() {
        assert_eq!(name_for_port(80, "tcp"), "http");
        assert_eq!(name_for_port(443, "tcp"), "https");
    }

    #[test]
    fn unknown_port_falls_back_to_number() {
        assert_eq!(name_for_port(54321, "tcp"), "54321");
    }
}
