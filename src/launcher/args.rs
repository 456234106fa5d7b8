use std::fmt;

use crate::preset::Preset;

/// Control operations addressed at an already submitted driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlVerb {
    Kill,
    Status,
}

impl fmt::Display for ControlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlVerb::Kill => write!(f, "kill"),
            ControlVerb::Status => write!(f, "status"),
        }
    }
}

/// Arguments for submitting `preset` in cluster deploy mode.
///
/// Layout: `--master`, `--deploy-mode=cluster`, `--name`, one `--conf=k=v`
/// per override, the main target, then the preset's positional arguments.
pub fn submit_args(master: &str, preset_name: &str, preset: &Preset) -> Vec<String> {
    let mut args = Vec::with_capacity(4 + preset.spark_conf.len() + preset.extra_args.len());
    args.push(format!("--master={}", master));
    args.push("--deploy-mode=cluster".to_string());
    args.push(format!("--name={}", preset_name));
    for (key, value) in &preset.spark_conf {
        args.push(format!("--conf={}={}", key, value));
    }
    args.push(preset.main_target.clone());
    args.extend(preset.extra_args.iter().cloned());
    args
}

/// Arguments for `--kill` / `--status` on the driver `<namespace>:<name>`.
pub fn control_args(master: &str, verb: ControlVerb, namespace: &str, name: &str) -> Vec<String> {
    vec![
        format!("--master={}", master),
        format!("--{}={}:{}", verb, namespace, name),
    ]
}
