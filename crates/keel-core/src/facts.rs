//! Host fact collection.
//!
//! Facts are injected into the variable scope at low priority before
//! expansion, so configs can branch on `os`, `distribution` or
//! `package_manager` without declaring them.

use std::env;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pathutil::home_dir;
use crate::vars::Variables;

/// Package managers with an `<name>_available` convenience flag.
const PACKAGE_MANAGERS: [&str; 8] = ["apt", "dnf", "yum", "pacman", "zypper", "apk", "brew", "port"];

/// Snapshot of host facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facts {
    /// `linux`, `darwin`, `windows`, ...
    pub os: String,
    /// `amd64`, `arm64`, ...
    pub arch: String,
    pub hostname: String,
    pub username: String,
    pub user_home: String,
    pub distribution: String,
    pub distribution_version: String,
    pub distribution_major: String,
    pub kernel_version: String,
    pub cpu_cores: usize,
    pub package_manager: String,
}

impl Facts {
    /// Flattens the facts into variables, adding the convenience booleans.
    pub fn to_map(&self) -> Variables {
        let mut vars = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Variables::new(),
        };

        for pm in PACKAGE_MANAGERS {
            vars.insert(
                format!("{pm}_available"),
                Value::Bool(self.package_manager == pm),
            );
        }
        vars.insert("linux".to_string(), Value::Bool(self.os == "linux"));
        vars.insert("darwin".to_string(), Value::Bool(self.os == "darwin"));
        vars.insert("macos".to_string(), Value::Bool(self.os == "darwin"));
        vars.insert("windows".to_string(), Value::Bool(self.os == "windows"));
        vars
    }
}

/// Produces host facts.
pub trait FactCollector: Send + Sync {
    fn collect(&self) -> Facts;
}

/// Fixed facts, for tests and for compiling plans for another host.
impl FactCollector for Facts {
    fn collect(&self) -> Facts {
        self.clone()
    }
}

/// Collects facts from the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFactCollector;

impl FactCollector for SystemFactCollector {
    fn collect(&self) -> Facts {
        let os = current_os().to_string();
        let (distribution, distribution_version) = if os == "linux" {
            fs::read_to_string("/etc/os-release")
                .map(|content| parse_os_release(&content))
                .unwrap_or_default()
        } else {
            (os.clone(), String::new())
        };
        let distribution_major = distribution_version
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        let package_manager = detect_package_manager(&os, &distribution);

        let facts = Facts {
            arch: current_arch().to_string(),
            hostname: host_name(),
            username: env::var("USER")
                .or_else(|_| env::var("USERNAME"))
                .unwrap_or_default(),
            user_home: home_dir()
                .map(|home| home.display().to_string())
                .unwrap_or_default(),
            distribution,
            distribution_version,
            distribution_major,
            kernel_version: read_trimmed("/proc/sys/kernel/osrelease"),
            cpu_cores: std::thread::available_parallelism().map_or(1, usize::from),
            package_manager,
            os,
        };
        debug!(
            "collected facts: os={} arch={} distribution={} package_manager={}",
            facts.os, facts.arch, facts.distribution, facts.package_manager
        );
        facts
    }
}

/// The running OS, using `darwin` for macOS.
pub fn current_os() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn current_arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

fn read_trimmed(path: &str) -> String {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn host_name() -> String {
    hostname::get().map_or_else(
        |e| {
            debug!("cannot read hostname: {e}");
            String::new()
        },
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Extracts `ID` and `VERSION_ID` from os-release content.
fn parse_os_release(content: &str) -> (String, String) {
    let mut id = String::new();
    let mut version = String::new();
    for line in content.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("ID=") {
            id = value.trim_matches('"').to_string();
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version = value.trim_matches('"').to_string();
        }
    }
    (id, version)
}

fn on_path(program: &str) -> bool {
    env::var_os("PATH").is_some_and(|paths| {
        env::split_paths(&paths).any(|dir| Path::new(&dir).join(program).is_file())
    })
}

fn detect_package_manager(os: &str, distribution: &str) -> String {
    let detected = match (os, distribution) {
        ("darwin", _) if on_path("brew") => Some("brew"),
        ("darwin", _) if on_path("port") => Some("port"),
        ("darwin", _) => None,
        (_, "ubuntu" | "debian" | "linuxmint") => Some("apt"),
        (_, "centos" | "rhel") if on_path("dnf") => Some("dnf"),
        (_, "centos" | "rhel") => Some("yum"),
        (_, "fedora") => Some("dnf"),
        (_, "arch" | "manjaro") => Some("pacman"),
        (_, "opensuse" | "sles") => Some("zypper"),
        (_, "alpine") => Some("apk"),
        ("linux", _) => ["apt", "dnf", "yum", "pacman", "zypper", "apk"]
            .into_iter()
            .find(|pm| on_path(pm)),
        _ => None,
    };
    detected.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_map_adds_booleans() {
        let facts = Facts {
            os: "linux".to_string(),
            package_manager: "apt".to_string(),
            cpu_cores: 4,
            ..Facts::default()
        };
        let map = facts.to_map();

        assert_eq!(map.get("os"), Some(&json!("linux")));
        assert_eq!(map.get("cpu_cores"), Some(&json!(4)));
        assert_eq!(map.get("linux"), Some(&json!(true)));
        assert_eq!(map.get("darwin"), Some(&json!(false)));
        assert_eq!(map.get("apt_available"), Some(&json!(true)));
        assert_eq!(map.get("brew_available"), Some(&json!(false)));
    }

    #[test]
    fn test_parse_os_release() {
        let content = "NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"22.04\"\n";
        assert_eq!(
            parse_os_release(content),
            ("ubuntu".to_string(), "22.04".to_string())
        );
    }

    #[test]
    fn test_system_collector_reports_current_os() {
        let facts = SystemFactCollector.collect();
        assert_eq!(facts.os, current_os());
        assert!(facts.cpu_cores >= 1);
        assert!(!facts.arch.is_empty());
    }

    #[test]
    fn test_hostname_comes_from_the_system() {
        let expected = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert_eq!(SystemFactCollector.collect().hostname, expected);
        assert!(!host_name().contains('\n'));
    }

    #[test]
    fn test_package_manager_by_distribution() {
        assert_eq!(detect_package_manager("linux", "debian"), "apt");
        assert_eq!(detect_package_manager("linux", "alpine"), "apk");
        assert_eq!(detect_package_manager("freebsd", ""), "");
    }
}
