//! Tipos de erro para a ponte de automação COM.
//!
//! Define [`AutomationError`] com variantes para falhas da ponte PowerShell
//! e erros COM reportados pelo Publisher. Usa `thiserror` para derivar
//! `Display` e `Error` automaticamente a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao conversar com o Publisher via ponte de automação.
///
/// As variantes cobrem as duas camadas de falha:
/// - [`Spawn`](AutomationError::Spawn) / [`ChannelClosed`](AutomationError::ChannelClosed) /
///   [`Protocol`](AutomationError::Protocol) — a própria ponte falhou
/// - [`Com`](AutomationError::Com) — o Publisher reportou um erro COM com HRESULT
#[derive(Debug, Error)]
pub enum AutomationError {
    /// O processo da ponte não pôde ser iniciado (PowerShell ausente, permissão).
    #[error("failed to start automation bridge: {0}")]
    Spawn(#[source] std::io::Error),

    /// A ponte encerrou antes de responder — canal stdin/stdout fechado.
    #[error("automation bridge channel closed unexpectedly")]
    ChannelClosed,

    /// A ponte respondeu algo fora do protocolo `OK` / `ERR <code> <msg>`.
    #[error("malformed bridge reply: {0}")]
    Protocol(String),

    /// Erro COM reportado pelo Publisher. O campo `code` carrega o HRESULT
    /// original, usado pela classificação de retentativa do supervisor.
    #[error("COM error {code}: {message}")]
    Com { code: i32, message: String },
}

impl AutomationError {
    /// HRESULT embutido, se este erro veio do lado COM.
    pub fn com_code(&self) -> Option<i32> {
        match self {
            AutomationError::Com { code, .. } => Some(*code),
            _ => None,
        }
    }
}
