//! Action payloads carried by steps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Step;
use crate::vars::Variables;

/// Discriminant of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Shell,
    Command,
    File,
    Template,
    Copy,
    Unarchive,
    Download,
    Package,
    Service,
    Assert,
    Preset,
    Print,
    ArtifactCapture,
    ArtifactValidate,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [ActionType; 14] = [
        ActionType::Shell,
        ActionType::Command,
        ActionType::File,
        ActionType::Template,
        ActionType::Copy,
        ActionType::Unarchive,
        ActionType::Download,
        ActionType::Package,
        ActionType::Service,
        ActionType::Assert,
        ActionType::Preset,
        ActionType::Print,
        ActionType::ArtifactCapture,
        ActionType::ArtifactValidate,
    ];

    /// The YAML key and registry name of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Shell => "shell",
            ActionType::Command => "command",
            ActionType::File => "file",
            ActionType::Template => "template",
            ActionType::Copy => "copy",
            ActionType::Unarchive => "unarchive",
            ActionType::Download => "download",
            ActionType::Package => "package",
            ActionType::Service => "service",
            ActionType::Assert => "assert",
            ActionType::Preset => "preset",
            ActionType::Print => "print",
            ActionType::ArtifactCapture => "artifact_capture",
            ActionType::ArtifactValidate => "artifact_validate",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown action type '{s}'"))
    }
}

/// The concrete operation a step performs.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Shell(ShellAction),
    Command(CommandAction),
    File(FileAction),
    Template(TemplateAction),
    Copy(CopyAction),
    Unarchive(UnarchiveAction),
    Download(DownloadAction),
    Package(PackageAction),
    Service(ServiceAction),
    Assert(AssertAction),
    Preset(PresetInvocation),
    Print(PrintAction),
    ArtifactCapture(ArtifactCaptureAction),
    ArtifactValidate(ArtifactValidateAction),
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Shell(_) => ActionType::Shell,
            Action::Command(_) => ActionType::Command,
            Action::File(_) => ActionType::File,
            Action::Template(_) => ActionType::Template,
            Action::Copy(_) => ActionType::Copy,
            Action::Unarchive(_) => ActionType::Unarchive,
            Action::Download(_) => ActionType::Download,
            Action::Package(_) => ActionType::Package,
            Action::Service(_) => ActionType::Service,
            Action::Assert(_) => ActionType::Assert,
            Action::Preset(_) => ActionType::Preset,
            Action::Print(_) => ActionType::Print,
            Action::ArtifactCapture(_) => ActionType::ArtifactCapture,
            Action::ArtifactValidate(_) => ActionType::ArtifactValidate,
        }
    }
}

/// Either the one-line string form of an action or its full mapping.
///
/// `shell: "make"` and `shell: { cmd: "make" }` are the same step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum Shorthand<T> {
    Short(String),
    Full(T),
}

impl<'de, T> Deserialize<'de> for Shorthand<T>
where
    T: de::DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Shorthand::Short(text)),
            other => T::deserialize(other)
                .map(Shorthand::Full)
                .map_err(de::Error::custom),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Runs a command through a shell interpreter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellAction {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
}

/// Runs a program directly, without shell interpolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandAction {
    pub argv: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
}

/// Manages a file, directory or link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileAction {
    pub path: String,
    /// file, directory, absent, link, hardlink, touch or perms
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Link target
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recurse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub backup: bool,
}

/// Renders a template file to a destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateAction {
    pub src: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Variables>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyAction {
    pub src: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub backup: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,
    /// Expected SHA256 or MD5 checksum
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnarchiveAction {
    pub src: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub strip_components: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creates: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadAction {
    pub url: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub backup: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageAction {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// present, absent or latest
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    /// Auto-detected when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manager: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub update_cache: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub upgrade: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAction {
    pub name: String,
    /// started, stopped, restarted or reloaded
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub daemon_reload: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<ServiceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropin: Option<ServiceDropin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceUnit {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dest: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDropin {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src_template: String,
}

/// Verifies state without changing it. Exactly one check is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<AssertCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssertFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<AssertHttp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertCommand {
    pub cmd: String,
    #[serde(default)]
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertHttp {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonpath_value: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

/// Invokes a reusable preset. Expansion happens at execution time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetInvocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Variables::is_empty")]
    pub with: Variables,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrintAction {
    #[serde(default)]
    pub msg: String,
}

/// Runs nested steps and records what they changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactCaptureAction {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_dir: String,
    /// json or markdown
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub capture_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diff_size: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub embed_plan: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_plan_steps: Option<u32>,
}

/// Checks a captured artifact against limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactValidateAction {
    pub artifact_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines_changed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub require_tests: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_paths: Vec<String>,
}
