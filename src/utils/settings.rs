//! Layered settings for Cyro
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults (the `Default` impls below)
//! 2. `<config_dir>/config.toml`, or a file passed explicitly
//! 3. `CYRO_*` environment variables, `__` separating nested keys
//!    (`CYRO_PROVIDER__MODEL=llama3.2`, `CYRO_ROUTING__SELECTION_TIMEOUT_SECS=5`)
//!
//! The loaded value is passed into constructors; nothing reads it globally.

use crate::types::Result;
use config::{Config, Environment, File, FileFormat};
use cyro_tools::ToolContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "CYRO";
const DEFAULT_CONFIG_DIR: &str = "~/.cyro";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyroSettings {
    /// Agent used by the CLI when none is named; `auto` routes every message
    pub default_agent: String,
    pub verbose: bool,
    pub color_output: bool,
    /// Root holding `config.toml` and the `agents/` directory
    pub config_dir: PathBuf,
    /// Directory tools operate in; the current directory when unset
    pub workspace_root: Option<PathBuf>,
    pub provider: ProviderSettings,
    pub routing: RoutingSettings,
    pub security: SecuritySettings,
}

impl Default for CyroSettings {
    fn default() -> Self {
        Self {
            default_agent: "auto".to_string(),
            verbose: false,
            color_output: true,
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            workspace_root: None,
            provider: ProviderSettings::default(),
            routing: RoutingSettings::default(),
            security: SecuritySettings::default(),
        }
    }
}

// ============= Provider Settings =============

/// OpenAI-compatible endpoint used for every model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding a bearer token, if the endpoint needs one
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub max_tool_iterations: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "qwen2.5-coder".to_string(),
            api_key_env: None,
            timeout_secs: 30,
            max_tool_iterations: 10,
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

// ============= Routing Settings =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Upper bound on the selection call before falling back to the default agent
    pub selection_timeout_secs: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            selection_timeout_secs: 30,
        }
    }
}

impl RoutingSettings {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_secs)
    }
}

// ============= Security Settings =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Refuse dangerous shell commands unless a call explicitly allows them
    pub sandbox_mode: bool,
    /// Tool categories whose sandbox checks a tool call cannot waive
    pub require_approval: Vec<String>,
    pub max_file_size_kb: u64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            sandbox_mode: true,
            require_approval: vec!["filesystem".to_string(), "execution".to_string()],
            max_file_size_kb: cyro_tools::DEFAULT_MAX_FILE_SIZE_KB,
        }
    }
}

// ============= Loading =============

impl CyroSettings {
    /// Load settings from `explicit_file` (which must exist) or from
    /// `<config_dir>/config.toml` (optional), overlaid with the process environment.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit_file, None)
    }

    /// Like [`CyroSettings::load`] but with the environment layer taken from
    /// `env` instead of the process when given.
    pub fn load_with_env(
        explicit_file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let file_source = match explicit_file {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => {
                let config_dir = env
                    .as_ref()
                    .and_then(|vars| vars.get("CYRO_CONFIG_DIR").cloned())
                    .or_else(|| std::env::var("CYRO_CONFIG_DIR").ok())
                    .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
                let path = expand_home(Path::new(&config_dir)).join(CONFIG_FILE_NAME);
                debug!(path = %path.display(), "Looking for settings file");
                File::from(path).format(FileFormat::Toml).required(false)
            }
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("security.require_approval")
            .source(env);

        let settings: CyroSettings = Config::builder()
            .add_source(file_source)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// `config_dir` with `~` expanded
    pub fn config_dir(&self) -> PathBuf {
        expand_home(&self.config_dir)
    }

    /// Directory scanned for agent definitions
    pub fn agents_dir(&self) -> PathBuf {
        self.config_dir().join("agents")
    }

    pub fn workspace_root(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) => expand_home(root),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Tool context handed to every toolset builder
    pub fn tool_context(&self) -> ToolContext {
        let mut ctx = ToolContext::new(self.workspace_root());
        ctx.command_timeout = self.provider.timeout();
        ctx.sandbox_mode = self.security.sandbox_mode;
        ctx.max_file_size_kb = self.security.max_file_size_kb;
        ctx.require_approval = self.security.require_approval.clone();
        ctx
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CyroSettings::load_with_env(
            None,
            env(&[("CYRO_CONFIG_DIR", dir.path().to_str().unwrap())]),
        )
        .unwrap();

        assert_eq!(settings.provider, ProviderSettings::default());
        assert_eq!(settings.routing.selection_timeout_secs, 30);
        assert!(settings.security.sandbox_mode);
        assert_eq!(settings.default_agent, "auto");
    }

    #[test]
    fn test_file_then_env_precedence() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "verbose = true\n\n[provider]\nmodel = \"llama3.2\"\ntimeout_secs = 5\n\n[routing]\nselection_timeout_secs = 7"
        )
        .unwrap();

        let settings = CyroSettings::load_with_env(
            Some(file.path()),
            env(&[
                ("CYRO_PROVIDER__MODEL", "mistral"),
                ("CYRO_SECURITY__SANDBOX_MODE", "false"),
                ("CYRO_SECURITY__REQUIRE_APPROVAL", "git,execution"),
            ]),
        )
        .unwrap();

        assert!(settings.verbose);
        assert_eq!(settings.provider.model, "mistral");
        assert_eq!(settings.provider.timeout_secs, 5);
        assert_eq!(settings.routing.selection_timeout(), Duration::from_secs(7));
        assert!(!settings.security.sandbox_mode);
        assert_eq!(settings.security.require_approval, vec!["git", "execution"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = CyroSettings::load_with_env(Some(Path::new("/nonexistent/cyro.toml")), env(&[]));
        assert!(matches!(result, Err(crate::CyroError::Config(_))));
    }

    #[test]
    fn test_expand_home_and_agents_dir() {
        let settings = CyroSettings {
            config_dir: PathBuf::from("/etc/cyro"),
            ..Default::default()
        };
        assert_eq!(settings.agents_dir(), PathBuf::from("/etc/cyro/agents"));
        assert_eq!(expand_home(Path::new("relative")), PathBuf::from("relative"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.cyro")), home.join(".cyro"));
        }
    }

    #[test]
    fn test_tool_context_carries_security_settings() {
        let settings = CyroSettings {
            workspace_root: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let ctx = settings.tool_context();

        assert!(ctx.sandbox_mode);
        assert_eq!(ctx.workspace_root, PathBuf::from("/work"));
        assert!(ctx.requires_approval("execution"));
        assert!(ctx.requires_approval("filesystem"));
        assert!(!ctx.requires_approval("web"));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let settings = CyroSettings::default();
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("[provider]"));
        let parsed: CyroSettings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }
}
