//! Step model definition and its YAML/JSON document form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::*;
use super::{LoopContext, Origin};
use crate::vars::Variables;

/// A compile-time directive. Consumed during expansion and never present on
/// a compiled step.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Path of another config file to splice in
    Include(String),
    /// Loop source expression; repeats the step's action per element
    WithItems(String),
    /// Directory to walk; repeats the step's action per entry
    WithFileTree(String),
    /// Inline variables written into the current scope
    Vars(Variables),
    /// Path of a variables file merged into the current scope
    IncludeVars(String),
}

impl Directive {
    /// Directive keys in dispatch priority order.
    pub const KEYS: [&'static str; 5] = ["include", "with_items", "with_filetree", "vars", "include_vars"];

    pub fn key(&self) -> &'static str {
        match self {
            Directive::Include(_) => "include",
            Directive::WithItems(_) => "with_items",
            Directive::WithFileTree(_) => "with_filetree",
            Directive::Vars(_) => "vars",
            Directive::IncludeVars(_) => "include_vars",
        }
    }

    /// Returns true for directives that repeat an action.
    pub fn is_loop(&self) -> bool {
        matches!(self, Directive::WithItems(_) | Directive::WithFileTree(_))
    }
}

/// One step declaration.
///
/// Source steps carry a directive, an action, or a loop directive wrapping an
/// action. Compiled steps carry only an action plus the plan metadata (`id`,
/// `action_type`, `origin`, `skipped`, `loop_context`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "StepDocument", into = "StepDocument")]
pub struct Step {
    /// Human label, rendered at compile time
    pub name: String,

    /// Run-time condition. Empty when unconditional.
    pub when: String,

    pub tags: Vec<String>,

    pub directive: Option<Directive>,

    pub action: Option<Action>,

    // Executor-facing fields, carried through untouched.
    pub creates: Option<String>,
    pub unless: Option<String>,
    pub r#become: bool,
    pub become_user: Option<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<String>,
    pub timeout: Option<String>,
    pub retries: u32,
    pub retry_delay: Option<String>,
    pub changed_when: Option<String>,
    pub failed_when: Option<String>,
    pub register: Option<String>,

    /// Stable identifier such as `step-0007`
    pub id: String,

    pub action_type: Option<ActionType>,

    pub origin: Option<Origin>,

    /// Excluded by the tag filter
    pub skipped: bool,

    pub loop_context: Option<LoopContext>,
}

impl Step {
    /// Creates an unnamed step performing `action`.
    pub fn with_action(action: Action) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    /// Creates an unnamed step holding only `directive`.
    pub fn with_directive(directive: Directive) -> Self {
        Self {
            directive: Some(directive),
            ..Self::default()
        }
    }

    /// Returns the name if set, otherwise the action type, otherwise the
    /// directive key.
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        if let Some(action) = &self.action {
            return action.action_type().as_str();
        }
        self.directive.as_ref().map_or("step", Directive::key)
    }
}

/// Flat serialized shape of a [`Step`], shared by config files and plan
/// files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StepDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    when: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unless: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    shell: Option<Shorthand<ShellAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<CommandAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<FileAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<TemplateAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    copy: Option<CopyAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unarchive: Option<UnarchiveAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    download: Option<DownloadAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    package: Option<PackageAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<ServiceAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assert: Option<AssertAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preset: Option<Shorthand<PresetInvocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    print: Option<Shorthand<PrintAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact_capture: Option<ArtifactCaptureAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact_validate: Option<ArtifactValidateAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    include_vars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vars: Option<Variables>,

    #[serde(default, rename = "become", skip_serializing_if = "is_false")]
    r#become: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    become_user: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changed_when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failed_when: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    with_filetree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    with_items: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    register: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<Origin>,
    #[serde(default, skip_serializing_if = "is_false")]
    skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loop_context: Option<LoopContext>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl StepDocument {
    /// Takes every action field that is set, in declaration order.
    fn take_actions(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(shell) = self.shell.take() {
            actions.push(Action::Shell(match shell {
                Shorthand::Short(cmd) => ShellAction {
                    cmd,
                    ..ShellAction::default()
                },
                Shorthand::Full(shell) => shell,
            }));
        }
        if let Some(command) = self.command.take() {
            actions.push(Action::Command(command));
        }
        if let Some(file) = self.file.take() {
            actions.push(Action::File(file));
        }
        if let Some(template) = self.template.take() {
            actions.push(Action::Template(template));
        }
        if let Some(copy) = self.copy.take() {
            actions.push(Action::Copy(copy));
        }
        if let Some(unarchive) = self.unarchive.take() {
            actions.push(Action::Unarchive(unarchive));
        }
        if let Some(download) = self.download.take() {
            actions.push(Action::Download(download));
        }
        if let Some(package) = self.package.take() {
            actions.push(Action::Package(package));
        }
        if let Some(service) = self.service.take() {
            actions.push(Action::Service(service));
        }
        if let Some(assert) = self.assert.take() {
            actions.push(Action::Assert(assert));
        }
        if let Some(preset) = self.preset.take() {
            actions.push(Action::Preset(match preset {
                Shorthand::Short(name) => PresetInvocation {
                    name,
                    ..PresetInvocation::default()
                },
                Shorthand::Full(preset) => preset,
            }));
        }
        if let Some(print) = self.print.take() {
            actions.push(Action::Print(match print {
                Shorthand::Short(msg) => PrintAction { msg },
                Shorthand::Full(print) => print,
            }));
        }
        if let Some(capture) = self.artifact_capture.take() {
            actions.push(Action::ArtifactCapture(capture));
        }
        if let Some(validate) = self.artifact_validate.take() {
            actions.push(Action::ArtifactValidate(validate));
        }
        actions
    }

    /// Takes the highest-priority directive, dropping any others.
    fn take_directive(&mut self) -> Option<Directive> {
        let include = self.include.take().map(Directive::Include);
        let with_items = self.with_items.take().map(Directive::WithItems);
        let with_filetree = self.with_filetree.take().map(Directive::WithFileTree);
        let vars = self.vars.take().map(Directive::Vars);
        let include_vars = self.include_vars.take().map(Directive::IncludeVars);
        include
            .or(with_items)
            .or(with_filetree)
            .or(vars)
            .or(include_vars)
    }
}

impl TryFrom<StepDocument> for Step {
    type Error = String;

    fn try_from(mut doc: StepDocument) -> Result<Self, Self::Error> {
        let mut actions = doc.take_actions();
        if actions.len() > 1 {
            let names: Vec<&str> = actions.iter().map(|a| a.action_type().as_str()).collect();
            return Err(format!(
                "step has multiple actions ({}); only one action is allowed per step",
                names.join(", ")
            ));
        }
        let action = actions.pop();
        let directive = doc.take_directive();

        match (&directive, &action) {
            (None, None) => {
                return Err(format!(
                    "step has no action; expected one of: {}",
                    ActionType::ALL.map(ActionType::as_str).join(", ")
                ));
            }
            (Some(directive), None) if directive.is_loop() => {
                return Err(format!(
                    "{} requires an action to repeat",
                    directive.key()
                ));
            }
            (Some(directive), Some(action)) if !directive.is_loop() => {
                return Err(format!(
                    "{} cannot be combined with action '{}'",
                    directive.key(),
                    action.action_type()
                ));
            }
            _ => {}
        }

        Ok(Step {
            name: doc.name,
            when: doc.when,
            tags: doc.tags,
            directive,
            action,
            creates: doc.creates,
            unless: doc.unless,
            r#become: doc.r#become,
            become_user: doc.become_user,
            env: doc.env,
            cwd: doc.cwd,
            timeout: doc.timeout,
            retries: doc.retries,
            retry_delay: doc.retry_delay,
            changed_when: doc.changed_when,
            failed_when: doc.failed_when,
            register: doc.register,
            id: doc.id,
            action_type: doc.action_type,
            origin: doc.origin,
            skipped: doc.skipped,
            loop_context: doc.loop_context,
        })
    }
}

impl From<Step> for StepDocument {
    fn from(step: Step) -> Self {
        let mut doc = StepDocument {
            id: step.id,
            name: step.name,
            when: step.when,
            creates: step.creates,
            unless: step.unless,
            r#become: step.r#become,
            become_user: step.become_user,
            env: step.env,
            cwd: step.cwd,
            timeout: step.timeout,
            retries: step.retries,
            retry_delay: step.retry_delay,
            changed_when: step.changed_when,
            failed_when: step.failed_when,
            tags: step.tags,
            register: step.register,
            action_type: step.action_type,
            origin: step.origin,
            skipped: step.skipped,
            loop_context: step.loop_context,
            ..StepDocument::default()
        };

        match step.directive {
            Some(Directive::Include(path)) => doc.include = Some(path),
            Some(Directive::WithItems(expr)) => doc.with_items = Some(expr),
            Some(Directive::WithFileTree(path)) => doc.with_filetree = Some(path),
            Some(Directive::Vars(vars)) => doc.vars = Some(vars),
            Some(Directive::IncludeVars(path)) => doc.include_vars = Some(path),
            None => {}
        }

        match step.action {
            Some(Action::Shell(shell)) => doc.shell = Some(Shorthand::Full(shell)),
            Some(Action::Command(command)) => doc.command = Some(command),
            Some(Action::File(file)) => doc.file = Some(file),
            Some(Action::Template(template)) => doc.template = Some(template),
            Some(Action::Copy(copy)) => doc.copy = Some(copy),
            Some(Action::Unarchive(unarchive)) => doc.unarchive = Some(unarchive),
            Some(Action::Download(download)) => doc.download = Some(download),
            Some(Action::Package(package)) => doc.package = Some(package),
            Some(Action::Service(service)) => doc.service = Some(service),
            Some(Action::Assert(assert)) => doc.assert = Some(assert),
            Some(Action::Preset(preset)) => doc.preset = Some(Shorthand::Full(preset)),
            Some(Action::Print(print)) => doc.print = Some(Shorthand::Full(print)),
            Some(Action::ArtifactCapture(capture)) => doc.artifact_capture = Some(capture),
            Some(Action::ArtifactValidate(validate)) => doc.artifact_validate = Some(validate),
            None => {}
        }

        doc
    }
}
