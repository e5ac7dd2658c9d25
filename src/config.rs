use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::key_store;
use crate::cleaner::Cleaner;
use crate::condense::{DEFAULT_FALLBACK_TARGET, DEFAULT_MAX_CHARS, DEFAULT_MIN_CHARS, LengthTarget};
use crate::llm::ChatSettings;
use crate::mail::digest::{DEFAULT_SKIP_SENDERS, Digest};
use crate::mail::extractor::{DEFAULT_REDIRECT_MARKER, Extractor};

pub const CONDENSER_SECTION: &str = "condenser";
pub const SCRIPT_SECTION: &str = "script";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub condenser: CondenserConfig,
    pub script: ScriptConfig,
    pub digest: DigestConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CondenserConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub min_chars: usize,
    pub max_chars: usize,
    pub fallback_target: usize,
    /// Environment variable checked before the keyring.
    pub api_key_env: String,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.sambanova.ai/v1/chat/completions".to_string(),
            model: "Meta-Llama-3.1-405B-Instruct".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
            fallback_target: DEFAULT_FALLBACK_TARGET,
            api_key_env: "SAMBANOVA_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScriptConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub api_key_env: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.3,
            top_p: 0.5,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DigestConfig {
    pub redirect_marker: String,
    pub skip_senders: Vec<String>,
    /// Extra line-start boilerplate triggers, matched literally.
    pub extra_boilerplate: Vec<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            redirect_marker: DEFAULT_REDIRECT_MARKER.to_string(),
            skip_senders: DEFAULT_SKIP_SENDERS.iter().map(|s| s.to_string()).collect(),
            extra_boilerplate: Vec::new(),
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join("soundbite"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

/// Loads the config from `path`, or from the default location when `None`.
///
/// A missing file is replaced by a template and reported as an error so the
/// user can review it before anything talks to an endpoint.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tom = toml::to_string_pretty(&Config::default())?;
        fs::write(&path, tom)?;
        return Err(anyhow!(
            "Created template config at {}, edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

/// Environment variable first, then the keyring entry for `section`.
pub fn resolve_api_key(section: &str, env_name: &str) -> Result<String> {
    if let Ok(key) = std::env::var(env_name) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    if let Some(key) = key_store::load_api_key(section)? {
        return Ok(key);
    }
    Err(anyhow!(
        "no API key for [{section}]: set ${env_name} or run `soundbite set-api-key --service {section}`"
    ))
}

impl CondenserConfig {
    pub fn length_target(&self) -> LengthTarget {
        LengthTarget {
            min_chars: self.min_chars,
            max_chars: self.max_chars,
            fallback_target: self.fallback_target,
        }
    }

    pub fn chat_settings(&self, api_key: String) -> ChatSettings {
        ChatSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
            temperature: None,
            top_p: None,
        }
    }
}

impl ScriptConfig {
    pub fn chat_settings(&self, api_key: String) -> ChatSettings {
        ChatSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
        }
    }
}

impl DigestConfig {
    pub fn extractor(&self) -> Result<Extractor> {
        let cleaner = Cleaner::with_extra_triggers(&self.extra_boilerplate)
            .context("compiling extra_boilerplate")?;
        Ok(Extractor::new(cleaner, self.redirect_marker.clone()))
    }

    pub fn digest(&self) -> Result<Digest> {
        Ok(Digest::new(self.extractor()?, self.skip_senders.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::{PartBody, RawPayload};
    use crate::mail::decoders::encode_body_data;

    #[test]
    fn missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Created template config"));
        assert!(path.exists());

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[condenser]\nfallback_target = 800\n\n[digest]\nextra_boilerplate = [\"Sponsored by\"]\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.condenser.fallback_target, 800);
        assert_eq!(cfg.condenser.min_chars, 650);
        assert_eq!(cfg.condenser.model, "Meta-Llama-3.1-405B-Instruct");
        assert_eq!(cfg.script, ScriptConfig::default());
        assert_eq!(cfg.digest.skip_senders, vec!["no-reply@substack.com"]);
        assert_eq!(cfg.digest.extra_boilerplate, vec!["Sponsored by"]);
    }

    #[test]
    fn length_target_from_section() {
        let cfg = CondenserConfig {
            min_chars: 10,
            max_chars: 20,
            fallback_target: 15,
            ..CondenserConfig::default()
        };
        let t = cfg.length_target();
        assert!(t.accepts(10) && t.accepts(20) && !t.accepts(21));
        assert_eq!(t.fallback_target, 15);
    }

    #[test]
    fn script_settings_carry_sampling() {
        let s = ScriptConfig::default().chat_settings("k".into());
        assert_eq!(s.temperature, Some(0.3));
        assert_eq!(s.top_p, Some(0.5));
        assert_eq!(s.timeout, Duration::from_secs(30));

        let c = CondenserConfig::default().chat_settings("k".into());
        assert_eq!(c.temperature, None);
    }

    #[test]
    fn extra_triggers_reach_the_cleaner() {
        let digest = DigestConfig {
            extra_boilerplate: vec!["Sponsored by".into()],
            ..DigestConfig::default()
        };
        let payload = RawPayload {
            mime_type: "text/html".into(),
            body: PartBody {
                data: Some(encode_body_data(b"<p>Real news.</p><p>Sponsored by Acme</p>")),
            },
            ..Default::default()
        };
        let text = digest.extractor().unwrap().extract_content(&payload);
        assert!(text.contains("Real news."));
        assert!(!text.contains("Sponsored"));
    }

    #[test]
    fn env_var_wins() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("SOUNDBITE_TEST_KEY_ENV_WINS", "  sk-123 \n") };
        let key = resolve_api_key("condenser", "SOUNDBITE_TEST_KEY_ENV_WINS").unwrap();
        assert_eq!(key, "sk-123");
    }
}
