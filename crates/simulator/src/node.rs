//! Node identity and private-network routing.
//!
//! Every host in the fleet derives a stable numeric identity from its own
//! hostname; the number seeds derived sensor names and picks one of the four
//! private interconnect addresses.

use std::io::Write;
use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

use contracts::HarnessError;

/// Numeric identity of the local host.
pub fn node_number() -> u32 {
    match hostname::get() {
        Ok(name) => node_number_from(&name.to_string_lossy()),
        Err(e) => {
            warn!(error = %e, "Cannot read hostname, using node 0");
            0
        }
    }
}

/// Derive a node number from a hostname.
///
/// Patterns are tried in order, each falling through when it does not match
/// or does not parse:
/// 1. trailing digit run after a hyphen (`sim-weka-12` -> 12)
/// 2. base-36 decode of a trailing 5-character token after a hyphen
///    (`dtn-aaaaa` -> 17276050)
/// 3. any digit run (`host12x` -> 12)
/// 4. 0
pub fn node_number_from(host: &str) -> u32 {
    let trailing_digits = Regex::new(r"-(\d+)$").expect("literal pattern");
    if let Some(caps) = trailing_digits.captures(host) {
        if let Ok(n) = caps[1].parse() {
            return n;
        }
    }

    let trailing_token = Regex::new(r"-([0-9a-zA-Z]{5})$").expect("literal pattern");
    if let Some(caps) = trailing_token.captures(host) {
        if let Ok(n) = u32::from_str_radix(&caps[1], 36) {
            return n;
        }
    }

    let any_digits = Regex::new(r"\d+").expect("literal pattern");
    if let Some(found) = any_digits.find(host) {
        if let Ok(n) = found.as_str().parse() {
            return n;
        }
    }

    0
}

/// Private interconnect address for this node, one of four chosen by
/// `node % 4`.
pub fn private_ip(node: u32) -> String {
    format!("199.36.153.{}", 8 + node % 4)
}

/// Append a static name-resolution override for `host` to `hosts_file`.
///
/// Forces object-store traffic onto the private interconnect. The file path
/// is injectable so tests never touch the real `/etc/hosts`.
pub fn append_hosts_override(
    hosts_file: &Path,
    host: &str,
    node: u32,
) -> Result<(), HarnessError> {
    let ip = private_ip(node);
    info!(
        ip = %ip,
        host,
        hosts_file = %hosts_file.display(),
        "Using private network"
    );
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(hosts_file)?;
    writeln!(file, "{ip} {host}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_digits_after_hyphen() {
        assert_eq!(node_number_from("sim-weka-12"), 12);
        assert_eq!(node_number_from("transfer-0"), 0);
    }

    #[test]
    fn test_base36_token_after_hyphen() {
        // "aaaaa" in base 36
        assert_eq!(node_number_from("dtn-aaaaa"), 17_276_050);
        assert_eq!(node_number_from("dtn-0000z"), 35);
    }

    #[test]
    fn test_any_digit_run() {
        assert_eq!(node_number_from("host12x"), 12);
        assert_eq!(node_number_from("n42-archiver"), 42);
    }

    #[test]
    fn test_no_digits_is_zero() {
        assert_eq!(node_number_from("localhost"), 0);
        assert_eq!(node_number_from(""), 0);
    }

    #[test]
    fn test_private_ip_cycles_over_four() {
        assert_eq!(private_ip(0), "199.36.153.8");
        assert_eq!(private_ip(1), "199.36.153.9");
        assert_eq!(private_ip(2), "199.36.153.10");
        assert_eq!(private_ip(3), "199.36.153.11");
        assert_eq!(private_ip(4), "199.36.153.8");
    }

    #[test]
    fn test_append_hosts_override() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();

        append_hosts_override(&hosts, "storage.googleapis.com", 6).unwrap();

        let contents = std::fs::read_to_string(&hosts).unwrap();
        assert!(contents.starts_with("127.0.0.1 localhost\n"));
        assert!(contents.ends_with("199.36.153.10 storage.googleapis.com\n"));
    }
}
