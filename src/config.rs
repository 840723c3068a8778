//! Configuração do motor de polling carregada a partir de `vitrine.toml`.
//!
//! A struct [`VitrineConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `VITRINE_API_KEY` tem precedência sobre o arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::poller::{PollerSettings, ResumeStyle};

/// Configuração de nível superior carregada de `vitrine.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct VitrineConfig {
    /// Chave da API do backend Vitrine.
    #[serde(default)]
    pub api_key: String,

    /// URL base do backend de geração.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Máximo de tentativas de consulta antes de declarar timeout.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Comportamento da primeira consulta ao voltar a ficar visível:
    /// `"immediate"` ou `"full_interval"`.
    #[serde(default = "default_resume")]
    pub resume: ResumeStyle,
}

// Valor padrão para a URL base do backend.
fn default_base_url() -> String {
    "https://api.vitrine.studio/v1".to_string()
}

// Valor padrão para o intervalo de polling: 4000ms.
fn default_poll_interval_ms() -> u64 {
    4000
}

// Valor padrão para tentativas máximas: 60.
fn default_max_retries() -> u32 {
    60
}

// Valor padrão para a retomada: consulta imediata.
fn default_resume() -> ResumeStyle {
    ResumeStyle::Immediate
}

impl Default for VitrineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_retries: default_max_retries(),
            resume: default_resume(),
        }
    }
}

impl VitrineConfig {
    /// Carrega a configuração de `vitrine.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("vitrine.toml"))
    }

    /// Carrega a configuração do caminho fornecido.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<VitrineConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para a chave API.
        if let Ok(key) = std::env::var("VITRINE_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        Ok(config)
    }

    /// Intervalo de polling como [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parâmetros do controlador derivados desta configuração.
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            max_retries: self.max_retries,
            resume: self.resume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = VitrineConfig::default();
        assert_eq!(config.base_url, "https://api.vitrine.studio/v1");
        assert_eq!(config.poll_interval_ms, 4000);
        assert_eq!(config.max_retries, 60);
        assert_eq!(config.resume, ResumeStyle::Immediate);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_key = "vt-test-123"
            max_retries = 5
            resume = "full_interval"
        "#;
        let config: VitrineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key, "vt-test-123");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.resume, ResumeStyle::FullInterval);
        assert_eq!(config.poll_interval_ms, 4000);
    }

    #[test]
    fn invalid_resume_value_is_rejected() {
        let toml_str = r#"resume = "eventually""#;
        assert!(toml::from_str::<VitrineConfig>(toml_str).is_err());
    }

    #[test]
    fn load_from_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 1500").unwrap();
        let config = VitrineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn load_from_missing_file_falls_back_to_defaults() {
        let config =
            VitrineConfig::load_from(Path::new("/tmp/definitely_missing_vitrine.toml")).unwrap();
        assert_eq!(config.max_retries, 60);
    }

    #[test]
    fn poller_settings_mirror_config() {
        let config = VitrineConfig {
            max_retries: 7,
            resume: ResumeStyle::FullInterval,
            ..Default::default()
        };
        let settings = config.poller_settings();
        assert_eq!(settings.max_retries, 7);
        assert_eq!(settings.resume, ResumeStyle::FullInterval);
    }
}
