//! Tipos de erro do cliente de status de jobs.
//!
//! Do ponto de vista do motor de polling, toda falha de consulta é
//! transitória: o job continua rodando no backend mesmo quando uma
//! consulta individual falha, então [`StudioError`] nunca é propagado ao
//! chamador — ele é entregue ao hook de erro e a tentativa conta contra o
//! orçamento compartilhado de retentativas. O que NÃO é erro: HTTP 404
//! vira [`FetchResult::NotFound`](super::types::FetchResult) no cliente,
//! porque um registro ainda-não-visível (ou já expirado) é um resultado
//! esperado do ciclo de vida do job, não uma falha.

use thiserror::Error;

/// Falha de uma consulta individual ao endpoint `GET /jobs/{job_id}`.
#[derive(Debug, Error)]
pub enum StudioError {
    /// HTTP 429 — a fila de geração compartilhada está sob pressão e o
    /// backend pediu para reduzir o ritmo das consultas. `retry_after_ms`
    /// vem do header `retry-after` (1000ms quando ausente).
    #[error("generation backend rate limited status polls, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Qualquer outro HTTP não-2xx do endpoint de status (exceto 404):
    /// 401 com chave de API revogada, 500 com a fila de workers
    /// indisponível, etc. Carrega o corpo da resposta como mensagem.
    #[error("status endpoint returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    /// A consulta nem chegou ao backend: DNS, conexão recusada, timeout
    /// do cliente. Típico quando a aba ficou offline entre um tick e
    /// outro de polling.
    #[error("could not reach status endpoint: {0}")]
    NetworkError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_tells_how_long_to_back_off() {
        let err = StudioError::RateLimited {
            retry_after_ms: 7000,
        };
        assert_eq!(
            err.to_string(),
            "generation backend rate limited status polls, retry after 7000ms"
        );
    }

    #[test]
    fn api_error_message_carries_status_and_body() {
        let err = StudioError::ApiError {
            status: 500,
            message: "worker pool exhausted".into(),
        };
        assert_eq!(
            err.to_string(),
            "status endpoint returned HTTP 500: worker pool exhausted"
        );
    }

    #[test]
    fn converts_into_anyhow_at_the_monitor_boundary() {
        // O tracker repassa falhas do cliente como anyhow::Error para o
        // controlador; a mensagem precisa sobreviver à conversão.
        let err = StudioError::ApiError {
            status: 401,
            message: "API key revoked".into(),
        };
        let boundary: anyhow::Error = err.into();
        assert!(boundary.to_string().contains("HTTP 401"));
        assert!(boundary.to_string().contains("API key revoked"));
    }
}
