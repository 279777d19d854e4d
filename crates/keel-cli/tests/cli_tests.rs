use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SITE: &str = r#"
vars:
  app: shop
  packages: [git, curl]
steps:
  - name: "install {{ item }}"
    shell: "echo installing {{ item }}"
    with_items: packages
    tags: [base]
  - include: roles/web.yml
"#;

const WEB_ROLE: &str = r#"
- name: "configure {{ app }}"
  file:
    path: "/etc/{{ app }}"
    state: directory
  tags: [web]
"#;

/// A config tree with a root file that includes a role.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Site {
            dir: TempDir::new().expect("Failed to create temporary directory"),
        };
        site.write("roles/web.yml", WEB_ROLE);
        site.write("site.yml", SITE);
        site
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn path(&self, relative: &str) -> String {
        self.dir.path().join(relative).display().to_string()
    }
}

/// Helper function to create a Command with --no-color flag for testing
fn keel_cmd() -> Command {
    let mut cmd = Command::cargo_bin("keel").expect("Failed to find keel binary");
    cmd.arg("--no-color");
    cmd
}

#[test]
fn test_cli_plan_text_output() {
    let site = Site::new();

    keel_cmd()
        .args(["plan", "--config", &site.path("site.yml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Plan: "))
        .stdout(predicate::str::contains("- Steps: 3"))
        .stdout(predicate::str::contains("## [1] install git (step-0001)"))
        .stdout(predicate::str::contains("## [3] configure shop (step-0003)"))
        .stdout(predicate::str::contains("- Loop: with_items[1] (first=false, last=true)"))
        .stdout(predicate::str::contains("Origin:").not());
}

#[test]
fn test_cli_plan_show_origins() {
    let site = Site::new();

    keel_cmd()
        .args(["plan", "-c", &site.path("site.yml"), "--show-origins"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "- Origin: {}:2:1",
            site.path("roles/web.yml")
        )))
        .stdout(predicate::str::contains(format!(
            "- Chain: {}:10",
            site.path("site.yml")
        )));
}

#[test]
fn test_cli_plan_json_output() {
    let site = Site::new();

    let output = keel_cmd()
        .args(["plan", "-c", &site.path("site.yml"), "--format", "json"])
        .output()
        .expect("Failed to run keel");
    assert!(output.status.success());

    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON plan");
    assert_eq!(plan["version"], "1.0");
    let steps = plan["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[1]["id"], "step-0002");
    assert_eq!(steps[1]["shell"]["cmd"], "echo installing curl");
    assert_eq!(steps[2]["file"]["path"], "/etc/shop");
}

#[test]
fn test_cli_plan_yaml_output() {
    let site = Site::new();

    keel_cmd()
        .args(["plan", "-c", &site.path("site.yml"), "-f", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steps:"))
        .stdout(predicate::str::contains("id: step-0001"));
}

#[test]
fn test_cli_plan_tags_mark_skipped() {
    let site = Site::new();

    keel_cmd()
        .args(["plan", "-c", &site.path("site.yml"), "--tags", "web, extra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Tags: web, extra"))
        .stdout(predicate::str::contains("- Steps: 3 (2 skipped)"))
        .stdout(predicate::str::contains("- Status: SKIPPED (tags)"));
}

#[test]
fn test_cli_plan_vars_file_overrides_config() {
    let site = Site::new();
    let vars = site.write("override.yml", "app: blog\n");

    keel_cmd()
        .args([
            "plan",
            "-c",
            &site.path("site.yml"),
            "--vars",
            vars.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("configure blog"));
}

#[test]
fn test_cli_plan_save_and_show() {
    let site = Site::new();

    for name in ["plan.json", "plan.yaml"] {
        let output = site.path(name);
        keel_cmd()
            .args(["plan", "-c", &site.path("site.yml"), "--output", &output])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Plan saved to {output}")));

        keel_cmd()
            .args(["show", &output])
            .assert()
            .success()
            .stdout(predicate::str::contains("## [2] install curl (step-0002)"));
    }
}

#[test]
fn test_cli_plan_unsupported_output_extension() {
    let site = Site::new();

    keel_cmd()
        .args([
            "plan",
            "-c",
            &site.path("site.yml"),
            "-o",
            &site.path("plan.txt"),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported file format: .txt"));
    assert!(!site.dir.path().join("plan.txt").exists());
}

#[test]
fn test_cli_plan_include_cycle_fails() {
    let site = Site::new();
    site.write("a.yml", "- include: b.yml\n");
    site.write("b.yml", "- include: a.yml\n");

    keel_cmd()
        .args(["plan", "-c", &site.path("a.yml")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("include cycle detected"));
}

#[test]
fn test_cli_plan_missing_config_fails() {
    let site = Site::new();

    keel_cmd()
        .args(["plan", "-c", &site.path("missing.yml")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to build plan"));
}

#[test]
fn test_cli_plan_invalid_config_exit_code() {
    let site = Site::new();
    site.write("bad.yml", "bogus: 1\nsteps: []\n");

    keel_cmd()
        .args(["plan", "-c", &site.path("bad.yml")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration validation failed"))
        .stderr(predicate::str::contains("unknown top-level key"));
}

#[test]
fn test_cli_validate_valid_config() {
    let site = Site::new();

    keel_cmd()
        .args(["validate", "--config", &site.path("site.yml")])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Configuration is valid: {}",
            site.path("site.yml")
        )));
}

#[test]
fn test_cli_validate_invalid_config() {
    let site = Site::new();
    site.write("bad.yml", "- name: broken\n  shell: \"echo {{ name\"\n");

    keel_cmd()
        .args(["validate", "-c", &site.path("bad.yml")])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("invalid template syntax in 'shell'"))
        .stdout(predicate::str::contains("Validation failed"));
}

#[test]
fn test_cli_validate_json_report() {
    let site = Site::new();

    keel_cmd()
        .args(["validate", "-c", &site.path("site.yml"), "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));
}

#[test]
fn test_cli_facts_json() {
    let output = keel_cmd()
        .args(["facts", "--format", "json"])
        .output()
        .expect("Failed to run keel");
    assert!(output.status.success());

    let facts: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON facts");
    assert!(facts["os"].is_string());
    assert!(facts["cpu_cores"].as_u64().unwrap_or(0) >= 1);
}

#[test]
fn test_cli_show_missing_plan_fails() {
    keel_cmd()
        .args(["show", "/nonexistent/plan.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load plan"));
}
