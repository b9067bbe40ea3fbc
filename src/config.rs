//! Configuração do pubhtml carregada a partir de `pubhtml.toml`.
//!
//! A struct [`PubHtmlConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis. Flags da CLI
//! têm precedência sobre o arquivo de configuração.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Configuração de nível superior carregada de `pubhtml.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PubHtmlConfig {
    /// Nome da imagem do processo do Publisher, para terminação por nome.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Constante de formato do `SaveAs` do Publisher (7 = HTML filtrado).
    #[serde(default = "default_format_code")]
    pub format_code: i32,

    /// Máximo de tentativas antes de marcar a conversão como falha.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Espera após `Open` para o estado interno do Publisher assentar.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Espera após matar processos para que terminem de fato.
    #[serde(default = "default_kill_wait_ms")]
    pub kill_wait_ms: u64,

    /// Espera adicional quando processos sobrevivem à terminação.
    #[serde(default = "default_kill_extra_wait_ms")]
    pub kill_extra_wait_ms: u64,

    /// HRESULTs COM considerados transitórios e portanto retentáveis.
    /// O default cobre apenas o diálogo modal bloqueando a automação;
    /// outros códigos podem ser acrescentados aqui conforme observados.
    #[serde(default = "default_retryable_error_codes")]
    pub retryable_error_codes: Vec<i32>,
}

// Imagem do processo do Publisher na tabela de processos do Windows.
fn default_process_name() -> String {
    "MSPUB.EXE".to_string()
}

// Constante de formato para HTML.
fn default_format_code() -> i32 {
    7
}

// Valor padrão para tentativas máximas: 3.
fn default_max_retries() -> u32 {
    3
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_kill_wait_ms() -> u64 {
    2000
}

fn default_kill_extra_wait_ms() -> u64 {
    5000
}

// -2147221457 é o erro de "diálogo modal aberto" observado em produção.
fn default_retryable_error_codes() -> Vec<i32> {
    vec![-2147221457]
}

impl Default for PubHtmlConfig {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            format_code: default_format_code(),
            max_retries: default_max_retries(),
            settle_delay_ms: default_settle_delay_ms(),
            kill_wait_ms: default_kill_wait_ms(),
            kill_extra_wait_ms: default_kill_extra_wait_ms(),
            retryable_error_codes: default_retryable_error_codes(),
        }
    }
}

impl PubHtmlConfig {
    /// Carrega a configuração de `pubhtml.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new("pubhtml.toml");
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<PubHtmlConfig>(&contents)?
        } else {
            Self::default()
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = PubHtmlConfig::default();
        assert_eq!(config.process_name, "MSPUB.EXE");
        assert_eq!(config.format_code, 7);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.settle_delay_ms, 1000);
        assert_eq!(config.kill_wait_ms, 2000);
        assert_eq!(config.retryable_error_codes, vec![-2147221457]);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            format_code = 2
            max_retries = 5
        "#;
        let config: PubHtmlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.format_code, 2);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.process_name, "MSPUB.EXE");
        assert_eq!(config.settle_delay_ms, 1000);
    }

    #[test]
    fn extra_retryable_codes_extend_the_list() {
        let toml_str = r#"
            retryable_error_codes = [-2147221457, -2147023170]
        "#;
        let config: PubHtmlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.retryable_error_codes,
            vec![-2147221457, -2147023170]
        );
    }

    #[test]
    fn load_falls_back_to_defaults() {
        // No ambiente de teste, tipicamente não há pubhtml.toml no diretório de trabalho.
        let config = PubHtmlConfig::load().unwrap();
        assert_eq!(config.max_retries, 3);
    }
}
