//! Markdown rendering of host facts.

use std::fmt;

use crate::facts::Facts;

impl fmt::Display for Facts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Host facts")?;
        writeln!(f)?;
        for (label, value) in [
            ("OS", self.os.as_str()),
            ("Arch", self.arch.as_str()),
            ("Hostname", self.hostname.as_str()),
            ("User", self.username.as_str()),
            ("Home", self.user_home.as_str()),
            ("Distribution", self.distribution.as_str()),
            ("Version", self.distribution_version.as_str()),
            ("Kernel", self.kernel_version.as_str()),
            ("Package manager", self.package_manager.as_str()),
        ] {
            if !value.is_empty() {
                writeln!(f, "- {label}: {value}")?;
            }
        }
        writeln!(f, "- CPU cores: {}", self.cpu_cores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facts_display_skips_unknown_values() {
        let facts = Facts {
            os: "linux".to_string(),
            distribution: "debian".to_string(),
            cpu_cores: 2,
            ..Facts::default()
        };
        let text = facts.to_string();

        assert!(text.contains("- OS: linux"));
        assert!(text.contains("- Distribution: debian"));
        assert!(text.contains("- CPU cores: 2"));
        assert!(!text.contains("Hostname"));
    }
}
