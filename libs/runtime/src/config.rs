use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::resolve_home_dir;

/// Subdirectory of the platform home used when `server.home_dir` is empty.
pub const DEFAULT_HOME_SUBDIR: &str = ".petstore";

/// Application configuration: typed global sections plus a per-module bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Logging sections; built-in defaults apply when absent.
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    /// Directory of `<module>.yaml` files merged into `modules`.
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// module name → arbitrary YAML/JSON value
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Normalized to an absolute path on load.
    #[serde(default)]
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub timeout_sec: u64,
}

/// Target prefix → logging settings. `"default"` covers every other target.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Section {
    /// `trace|debug|info|warn|error|off`
    #[serde(default = "default_console_level")]
    pub console_level: String,
    /// Log file, relative to `server.home_dir` unless absolute. Empty disables it.
    #[serde(default)]
    pub file: String,
    #[serde(default = "default_file_level")]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

fn default_console_level() -> String {
    "info".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.petstore (%APPDATA%\.petstore on Windows)
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/petstore.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// defaults → YAML file → `APP__SECTION__KEY` environment variables.
    /// Normalizes and creates `server.home_dir`.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file '{}' does not exist", path.display());
        }

        // Optional sections stay None unless YAML or ENV provide them.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?;

        normalize_home_dir_inplace(&mut config.server)?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, &dir)
                .with_context(|| format!("Failed to merge module configs from '{dir}'"))?;
        }

        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)?;
                Ok(c)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// `--port` replaces `server.port`; each `-v` raises the default console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        logging
            .entry("default".to_string())
            .or_insert_with(|| Section {
                console_level: default_console_level(),
                file: String::new(),
                file_level: default_file_level(),
                max_backups: None,
                max_size_mb: None,
            })
            .console_level = level.to_string();
    }

    /// Typed view of `modules.<name>`; `None` when the section is absent.
    pub fn module_config<T: DeserializeOwned>(&self, name: &str) -> Option<Result<T>> {
        self.modules.get(name).map(|raw| {
            T::deserialize(raw).with_context(|| format!("Invalid config for module '{name}'"))
        })
    }

    pub fn home_dir(&self) -> &Path {
        Path::new(&self.server.home_dir)
    }
}

/// Options the binary's command line can override.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let requested = Some(server.home_dir.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let resolved: PathBuf = resolve_home_dir(requested, DEFAULT_HOME_SUBDIR, true)
        .context("Failed to resolve server.home_dir")?;

    server.home_dir = resolved.to_string_lossy().into_owned();
    Ok(())
}

/// Each `<name>.yaml`/`<name>.yml` in `dir` becomes `modules.<name>`,
/// replacing an inline section of the same name.
fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;

    let dir = dir.as_ref();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "modules_dir does not exist, skipping");
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_yaml {
            continue;
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in '{}'", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(val)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8087);
        assert_eq!(config.server.home_dir, "");

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(logging["default"].console_level, "info");
        assert_eq!(logging["default"].file, "logs/petstore.log");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn yaml_file_is_layered_over_defaults() {
        let tmp = tempdir().unwrap();
        let home = tmp.path().join("home");
        let yaml = format!(
            r#"
server:
  home_dir: "{}"
  host: "0.0.0.0"
  port: 9090

logging:
  api_docs:
    console_level: debug
    file: "logs/api.log"
"#,
            home.to_string_lossy().replace('\\', "/")
        );
        let config = AppConfig::load_layered(write_config(tmp.path(), &yaml)).unwrap();

        assert!(home.is_dir(), "home_dir is created");
        assert!(config.home_dir().is_absolute());
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.timeout_sec, 0);

        let section = &config.logging.as_ref().unwrap()["api_docs"];
        assert_eq!(section.console_level, "debug");
        assert_eq!(section.file_level, "debug");
        assert_eq!(section.max_backups, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = AppConfig::load_layered(tmp.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn unknown_server_field_is_rejected() {
        let tmp = tempdir().unwrap();
        let home = tmp.path().to_string_lossy().replace('\\', "/");
        let yaml = format!("server:\n  home_dir: \"{home}\"\n  host: h\n  port: 1\n  prot: 2\n");
        assert!(AppConfig::load_layered(write_config(tmp.path(), &yaml)).is_err());
    }

    #[test]
    fn modules_dir_files_are_merged() {
        let tmp = tempdir().unwrap();
        let modules_dir = tmp.path().join("modules");
        fs::create_dir_all(&modules_dir).unwrap();
        fs::write(modules_dir.join("api_docs.yaml"), "bind_addr: \"127.0.0.1:1\"\n").unwrap();
        fs::write(modules_dir.join("notes.txt"), "ignored").unwrap();

        let yaml = format!(
            r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 8087
modules_dir: "{modules}"
modules:
  inline:
    key: "value"
"#,
            home = tmp.path().to_string_lossy().replace('\\', "/"),
            modules = modules_dir.to_string_lossy().replace('\\', "/"),
        );
        let config = AppConfig::load_layered(write_config(tmp.path(), &yaml)).unwrap();

        assert_eq!(config.modules["inline"]["key"], "value");
        assert_eq!(config.modules["api_docs"]["bind_addr"], "127.0.0.1:1");
        assert!(!config.modules.contains_key("notes"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Demo {
        enabled: bool,
        #[serde(default)]
        limit: u32,
    }

    #[test]
    fn module_config_is_typed() {
        let mut config = AppConfig::default();
        assert!(config.module_config::<Demo>("demo").is_none());

        config
            .modules
            .insert("demo".into(), serde_json::json!({"enabled": true}));
        let demo = config.module_config::<Demo>("demo").unwrap().unwrap();
        assert_eq!(demo, Demo { enabled: true, limit: 0 });

        config
            .modules
            .insert("demo".into(), serde_json::json!({"enabeld": true}));
        let err = config.module_config::<Demo>("demo").unwrap().unwrap_err();
        assert!(err.to_string().contains("demo"));
    }

    #[test]
    fn cli_overrides() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (5, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliArgs {
                port: Some(3000),
                verbose,
                ..CliArgs::default()
            });
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.logging.as_ref().unwrap()["default"].console_level, expected);
        }
    }

    #[test]
    fn verbose_creates_missing_default_section() {
        let mut config = AppConfig {
            logging: Some(HashMap::new()),
            ..AppConfig::default()
        };
        config.apply_cli_overrides(&CliArgs {
            verbose: 1,
            ..CliArgs::default()
        });
        let section = &config.logging.as_ref().unwrap()["default"];
        assert_eq!(section.console_level, "debug");
        assert_eq!(section.file, "");
    }

    #[test]
    fn yaml_roundtrip() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));
        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.server.port, config.server.port);
        assert_eq!(back.logging, config.logging);
    }
}
