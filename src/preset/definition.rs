use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Error raised while turning a preset document into a [`Preset`].
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Invalid preset document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Preset has no main application target")]
    MissingMain,
}

/// A named, pre-declared Spark application.
///
/// Loaded once from `<preset_dir>/<name>.yaml`:
///
/// ```yaml
/// main: local:///opt/spark/examples/src/main/python/pi.py
/// args: ["1000"]
/// sparkConf:
///   spark.executor.instances: 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
    /// Registry key, taken from the file name
    #[serde(skip)]
    pub name: String,

    /// Application entry point handed to the launcher
    #[serde(rename = "main")]
    pub main_target: String,

    /// Positional arguments passed after the entry point
    #[serde(rename = "args", default, deserialize_with = "scalar_list")]
    pub extra_args: Vec<String>,

    /// `--conf` overrides. Order carries no meaning.
    #[serde(rename = "sparkConf", default, deserialize_with = "scalar_map")]
    pub spark_conf: BTreeMap<String, String>,
}

impl Preset {
    pub fn new(name: impl Into<String>, main_target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            main_target: main_target.into(),
            extra_args: Vec::new(),
            spark_conf: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn with_conf(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spark_conf.insert(key.into(), value.into());
        self
    }

    /// Parse a YAML preset document and name it.
    pub fn from_yaml(name: impl Into<String>, raw: &str) -> Result<Self, PresetError> {
        let mut preset: Preset = serde_yaml::from_str(raw)?;
        if preset.main_target.trim().is_empty() {
            return Err(PresetError::MissingMain);
        }
        preset.name = name.into();
        Ok(preset)
    }
}

// Scalars are accepted anywhere a string is expected: `spark.driver.cores: 1`
// and `args: [100]` are common in hand-written presets.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|value| {
            scalar_to_string(value).ok_or_else(|| D::Error::custom("args entries must be scalars"))
        })
        .collect()
}

fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(key, value)| match scalar_to_string(value) {
            Some(value) => Ok((key, value)),
            None => Err(D::Error::custom(format!(
                "sparkConf value for {key} must be a scalar"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let raw = r#"
main: /app/example.py
args:
  - "--verbose=true"
sparkConf:
  spark.kubernetes.namespace: spark
"#;
        let preset = Preset::from_yaml("mypreset", raw).unwrap();
        assert_eq!(
            preset,
            Preset::new("mypreset", "/app/example.py")
                .with_arg("--verbose=true")
                .with_conf("spark.kubernetes.namespace", "spark")
        );
    }

    #[test]
    fn args_and_conf_are_optional() {
        let preset = Preset::from_yaml("bare", "main: /app/bare.py\n").unwrap();
        assert!(preset.extra_args.is_empty());
        assert!(preset.spark_conf.is_empty());
    }

    #[test]
    fn explicit_nulls_are_treated_as_empty() {
        let preset = Preset::from_yaml("nulls", "main: /app/x.py\nargs:\nsparkConf:\n").unwrap();
        assert!(preset.extra_args.is_empty());
        assert!(preset.spark_conf.is_empty());
    }

    #[test]
    fn scalar_values_become_strings() {
        let raw = r#"
main: /app/pi.py
args: [10000000, true]
sparkConf:
  spark.executor.instances: 2
  spark.dynamicAllocation.enabled: false
  spark.driver.memory: 512m
"#;
        let preset = Preset::from_yaml("pi", raw).unwrap();
        assert_eq!(preset.extra_args, vec!["10000000", "true"]);
        assert_eq!(preset.spark_conf["spark.executor.instances"], "2");
        assert_eq!(preset.spark_conf["spark.dynamicAllocation.enabled"], "false");
        assert_eq!(preset.spark_conf["spark.driver.memory"], "512m");
    }

    #[test]
    fn missing_main_is_rejected() {
        let err = Preset::from_yaml("nomain", "args: [a]\n").unwrap_err();
        assert!(matches!(err, PresetError::Parse(_)));
    }

    #[test]
    fn empty_main_is_rejected() {
        let err = Preset::from_yaml("empty", "main: \"\"\n").unwrap_err();
        assert!(matches!(err, PresetError::MissingMain));
    }

    #[test]
    fn nested_conf_value_is_rejected() {
        let raw = "main: /app/x.py\nsparkConf:\n  nested:\n    a: b\n";
        assert!(Preset::from_yaml("nested", raw).is_err());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(Preset::from_yaml("broken", "main: [unclosed\n").is_err());
    }
}
