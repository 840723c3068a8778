//! Tipos de dados para o endpoint de status de jobs do backend Vitrine.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato retornado pelo endpoint `GET /jobs/{job_id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status grosso de um job de geração, conforme reportado pelo backend.
///
/// `Completed` e `Failed` são terminais: uma vez observados, o polling
/// daquele job não deve continuar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job aceito pelo backend, aguardando um worker.
    Pending,
    /// Worker executando a geração (campo `progress` acompanha).
    Processing,
    /// Geração concluída com sucesso; `image_ids`/`video_url` preenchidos.
    Completed,
    /// Geração falhou; o campo `error` descreve o motivo.
    Failed,
}

impl JobStatus {
    /// Retorna `true` para os status terminais (`Completed` e `Failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Corpo da resposta do endpoint `GET /jobs/{job_id}`.
///
/// Além do status grosso, carrega os campos finos (progresso, erro) e os
/// campos de domínio produzidos pela geração (ids de imagem, URL de vídeo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusPayload {
    /// Status grosso do job.
    pub status: JobStatus,
    /// Progresso da geração em percentual (0.0–100.0), quando disponível.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Mensagem de erro do backend quando `status == failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Identificadores das imagens geradas (vazio até a conclusão).
    #[serde(default)]
    pub image_ids: Vec<String>,
    /// URL do vídeo gerado, para jobs de vídeo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Momento em que o job entrou na fila do backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
    /// Momento em que o job atingiu um status terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobStatusPayload {
    /// Payload mínimo com apenas o status grosso preenchido.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            progress: None,
            error: None,
            image_ids: Vec::new(),
            video_url: None,
            queued_at: None,
            completed_at: None,
        }
    }
}

/// Resultado de uma tentativa de consulta de status.
///
/// `NotFound` sinaliza HTTP 404 — o registro do job ainda não está visível
/// externamente (atraso de consistência eventual) ou já foi limpo pelo TTL
/// do backend.
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// O backend retornou um payload de status.
    Status(JobStatusPayload),
    /// O backend não conhece (ou não conhece mais) o job.
    NotFound,
}
