//! Compiler options and `tspconfig.json` parsing.
//!
//! Options come from a JSON config file, then from command line arguments.
//! Emitter settings are passed as `emitter-option-<emitter>.<key>=<value>`
//! and folded into [`CompilerOptions::options`]. Keys the compiler does not
//! know are kept in [`CompilerOptions::extra`].
//!
//! Paths may contain `{variable}` segments, expanded by
//! [`CompilerOptions::resolve_paths`].

use crate::host::{CompilerHost, HostError};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const EMITTER_OPTION_PREFIX: &str = "emitter-option-";

/// `{name}` with the `/` or `.` following it, if any.
const INTERPOLATION_PATTERN: &str = r"\{([a-zA-Z\-_.]+)\}(/|\.?)";

/// Settings of one emitter, by key.
pub type EmitterOptions = IndexMap<String, Value>;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: HostError,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid emitter option '{0}', expected <emitter>.<key>=<value>")]
    InvalidEmitterOption(String),
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Values `{name}` segments expand to. Dotted names look into objects.
pub type PathVariables = IndexMap<String, Value>;

/// Expand `{name}` segments of `path`. A name with no value drops the
/// segment together with a `/` or `.` right after it.
pub fn interpolate_path(path: &str, variables: &PathVariables) -> Result<String, OptionsError> {
    let pattern = Regex::new(INTERPOLATION_PATTERN)?;
    let expanded = pattern.replace_all(path, |caps: &Captures| match lookup_variable(variables, &caps[1]) {
        Some(value) => format!("{}{}", value, &caps[2]),
        None => String::new(),
    });
    Ok(expanded.into_owned())
}

fn lookup_variable(variables: &PathVariables, name: &str) -> Option<String> {
    let mut parts = name.split('.');
    let mut value = variables.get(parts.next()?)?;
    for part in parts {
        value = value.get(part)?;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Options for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Emitters to run, by name.
    #[serde(default)]
    pub emit: Vec<String>,
    /// Per-emitter settings.
    #[serde(default)]
    pub options: IndexMap<String, EmitterOptions>,
    /// Report warnings as errors.
    #[serde(default)]
    pub warn_as_error: bool,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CompilerOptions {
    pub fn from_json(content: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a `tspconfig.json`-style file through the host.
    pub fn from_json_file(host: &dyn CompilerHost, path: &str) -> Result<Self, OptionsError> {
        let content = host.read_file(path).map_err(|source| OptionsError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| OptionsError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Settings of `emitter`, if any were given.
    pub fn emitter_options(&self, emitter: &str) -> Option<&EmitterOptions> {
        self.options.get(emitter)
    }

    /// Apply one `key=value` argument. `emitter-option-<emitter>.<key>` keys
    /// set an emitter option; a key without `.<key>` only registers the
    /// emitter.
    pub fn apply_argument(&mut self, key: &str, value: &str) -> Result<(), OptionsError> {
        if let Some(rest) = key.strip_prefix(EMITTER_OPTION_PREFIX) {
            let (emitter, option) = match rest.split_once('.') {
                Some((emitter, option)) => (emitter, Some(option)),
                None => (rest, None),
            };
            if emitter.is_empty() || option.is_some_and(str::is_empty) {
                return Err(OptionsError::InvalidEmitterOption(format!("{}={}", rest, value)));
            }
            let entry = self.options.entry(emitter.to_string()).or_default();
            if let Some(option) = option {
                entry.insert(option.to_string(), Value::String(value.to_string()));
            }
            return Ok(());
        }
        match key {
            "output-dir" | "outputDir" => self.output_dir = Some(value.to_string()),
            "emit" => self.emit.push(value.to_string()),
            "warn-as-error" | "warnAsError" => {
                self.warn_as_error = value.parse().map_err(|_| OptionsError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
            }
            _ => {
                self.extra.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        Ok(())
    }

    /// Apply a command line `--option <emitter>.<key>=<value>`.
    pub fn apply_emitter_option(&mut self, argument: &str) -> Result<(), OptionsError> {
        let (key, value) = argument
            .split_once('=')
            .ok_or_else(|| OptionsError::InvalidEmitterOption(argument.to_string()))?;
        if !key.contains('.') {
            return Err(OptionsError::InvalidEmitterOption(argument.to_string()));
        }
        self.apply_argument(&format!("{}{}", EMITTER_OPTION_PREFIX, key), value)
    }

    /// Expand `{variable}` segments in `outputDir` and in the string
    /// settings of every emitter. Variables are the unknown config keys plus
    /// `project-root` and `cwd`; emitter settings also see `output-dir` and
    /// `emitter-name`.
    pub fn resolve_paths(&mut self, project_root: &str, cwd: &str) -> Result<(), OptionsError> {
        let mut variables: PathVariables = self.extra.clone();
        variables.insert("project-root".to_string(), Value::String(project_root.to_string()));
        variables.insert("cwd".to_string(), Value::String(cwd.to_string()));

        if let Some(output_dir) = &self.output_dir {
            let resolved = interpolate_path(output_dir, &variables)?;
            variables.insert("output-dir".to_string(), Value::String(resolved.clone()));
            self.output_dir = Some(resolved);
        }
        for (emitter, settings) in self.options.iter_mut() {
            variables.insert("emitter-name".to_string(), Value::String(emitter.clone()));
            for setting in settings.values_mut() {
                if let Value::String(text) = setting {
                    *text = interpolate_path(text, &variables)?;
                }
            }
        }
        Ok(())
    }

    /// Layer `overrides` on top of these options. Scalars set in
    /// `overrides` win, lists are appended and emitter settings merged key by
    /// key.
    pub fn merge(mut self, overrides: CompilerOptions) -> Self {
        if overrides.output_dir.is_some() {
            self.output_dir = overrides.output_dir;
        }
        for emitter in overrides.emit {
            if !self.emit.contains(&emitter) {
                self.emit.push(emitter);
            }
        }
        for (emitter, settings) in overrides.options {
            self.options.entry(emitter).or_default().extend(settings);
        }
        self.warn_as_error |= overrides.warn_as_error;
        self.extra.extend(overrides.extra);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VirtualFsHost;

    #[test]
    fn test_parse_config_keeps_unknown_keys() {
        let options = CompilerOptions::from_json(
            r#"{
                "outputDir": "out",
                "emit": ["openapi"],
                "options": { "openapi": { "file-type": "yaml" } },
                "warnAsError": true,
                "trace": ["checker"]
            }"#,
        )
        .unwrap();
        assert_eq!(options.output_dir.as_deref(), Some("out"));
        assert_eq!(options.emit, vec!["openapi"]);
        assert_eq!(options.options["openapi"]["file-type"], Value::String("yaml".into()));
        assert!(options.warn_as_error);
        assert_eq!(options.extra["trace"], serde_json::json!(["checker"]));

        let round_trip = serde_json::to_value(&options).unwrap();
        assert_eq!(round_trip["trace"], serde_json::json!(["checker"]));
        assert_eq!(round_trip["outputDir"], "out");
    }

    #[test]
    fn test_empty_config() {
        let options = CompilerOptions::from_json("{}").unwrap();
        assert_eq!(options, CompilerOptions::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(CompilerOptions::from_json("{"), Err(OptionsError::Json(_))));
        assert!(matches!(
            CompilerOptions::from_json(r#"{ "emit": "openapi" }"#),
            Err(OptionsError::Json(_))
        ));
    }

    #[test]
    fn test_config_file_through_host() {
        let host = VirtualFsHost::new().with_file("/proj/tspconfig.json", r#"{ "emit": ["a"] }"#);
        let options = CompilerOptions::from_json_file(&host, "/proj/tspconfig.json").unwrap();
        assert_eq!(options.emit, vec!["a"]);

        let missing = CompilerOptions::from_json_file(&host, "/proj/missing.json").unwrap_err();
        assert!(matches!(missing, OptionsError::Read { .. }));
        assert!(missing.to_string().contains("/proj/missing.json"));
    }

    #[test]
    fn test_emitter_arguments_fold() {
        let mut options = CompilerOptions::default();
        options.apply_argument("emitter-option-openapi.file-type", "json").unwrap();
        options.apply_argument("emitter-option-openapi.new-line", "lf").unwrap();
        options.apply_argument("emitter-option-protobuf", "ignored").unwrap();
        options.apply_argument("output-dir", "dist").unwrap();
        options.apply_argument("no-emit", "true").unwrap();

        let openapi = options.emitter_options("openapi").unwrap();
        assert_eq!(openapi.len(), 2);
        assert_eq!(openapi["file-type"], Value::String("json".into()));
        assert!(options.emitter_options("protobuf").unwrap().is_empty());
        assert_eq!(options.output_dir.as_deref(), Some("dist"));
        assert_eq!(options.extra["no-emit"], Value::String("true".into()));
    }

    #[test]
    fn test_invalid_arguments() {
        let mut options = CompilerOptions::default();
        assert!(options.apply_argument("emitter-option-.key", "v").is_err());
        assert!(options.apply_argument("emitter-option-a.", "v").is_err());
        assert!(options.apply_argument("warn-as-error", "maybe").is_err());
        assert!(options.apply_emitter_option("openapi.file-type").is_err());
        assert!(options.apply_emitter_option("openapi=json").is_err());
        options.apply_emitter_option("openapi.file-type=yaml=1").unwrap();
        assert_eq!(options.options["openapi"]["file-type"], Value::String("yaml=1".into()));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = CompilerOptions::from_json(
            r#"{ "outputDir": "out", "emit": ["a"], "options": { "a": { "x": "1", "y": "2" } } }"#,
        )
        .unwrap();
        let mut cli = CompilerOptions {
            output_dir: Some("dist".into()),
            emit: vec!["a".into(), "b".into()],
            warn_as_error: true,
            ..Default::default()
        };
        cli.apply_emitter_option("a.y=3").unwrap();

        let merged = file.merge(cli);
        assert_eq!(merged.output_dir.as_deref(), Some("dist"));
        assert_eq!(merged.emit, vec!["a", "b"]);
        assert_eq!(merged.options["a"]["x"], Value::String("1".into()));
        assert_eq!(merged.options["a"]["y"], Value::String("3".into()));
        assert!(merged.warn_as_error);
    }

    fn variables(pairs: &[(&str, &str)]) -> PathVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_interpolate_path() {
        let version = variables(&[("version", "v1")]);
        assert_eq!(interpolate_path("output.json", &PathVariables::new()).unwrap(), "output.json");
        assert_eq!(interpolate_path("{version}/output.json", &version).unwrap(), "v1/output.json");
        assert_eq!(interpolate_path("output.{version}.json", &version).unwrap(), "output.v1.json");
    }

    #[test]
    fn test_interpolate_missing_variable() {
        let other = variables(&[("serviceName", "PetStore")]);
        assert_eq!(interpolate_path("dist/{version}/output.json", &other).unwrap(), "dist/output.json");
        assert_eq!(interpolate_path("dist/{version}.output.json", &other).unwrap(), "dist/output.json");
        assert_eq!(
            interpolate_path("dist/{version}-suffix/output.json", &other).unwrap(),
            "dist/-suffix/output.json"
        );
    }

    #[test]
    fn test_interpolate_nested_variable() {
        let mut vars = PathVariables::new();
        vars.insert("service".into(), serde_json::json!({ "name": "pets", "version": 2 }));
        assert_eq!(interpolate_path("{service.name}/v{service.version}", &vars).unwrap(), "pets/v2");
    }

    #[test]
    fn test_resolve_paths() {
        let mut options = CompilerOptions::from_json(
            r#"{
                "outputDir": "{project-root}/out/{version}",
                "version": "v1",
                "options": { "openapi": { "emitter-output-dir": "{output-dir}/{emitter-name}", "file-type": "json" } }
            }"#,
        )
        .unwrap();
        options.resolve_paths("/proj", "/work").unwrap();
        assert_eq!(options.output_dir.as_deref(), Some("/proj/out/v1"));
        let openapi = options.emitter_options("openapi").unwrap();
        assert_eq!(openapi["emitter-output-dir"], Value::String("/proj/out/v1/openapi".into()));
        assert_eq!(openapi["file-type"], Value::String("json".into()));
    }
}
