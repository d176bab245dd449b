use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{lenient_string, Envelope};
use crate::{ApiClient, ApiError};

pub const DEFAULT_PER_PAGE: u32 = 10;

/// One check-in (baixa) line sent to `/api/mtr/salvar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInEntry {
    pub mtr: String,
    pub usuario: String,
    #[serde(rename = "dataBaixa")]
    pub data_baixa: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mtr: Option<String>,
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default)]
    pub data_baixa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub page: u32,
    pub per_page: u32,
    pub items: Vec<HistoryItem>,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    items: Option<Vec<HistoryItem>>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(rename = "totalPaginas", default)]
    total_paginas: Option<u64>,
}

#[async_trait::async_trait]
pub trait CheckInSink: Send + Sync {
    async fn check_in(&self, entries: &[CheckInEntry]) -> Result<(), ApiError>;
}

impl ApiClient {
    /// Pages are 1-based; 0 is treated as 1.
    pub async fn list_history(&self, page: u32, per_page: u32) -> Result<HistoryPage, ApiError> {
        let page = page.max(1);
        let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
        let mut url = self.url("/api/mtr/listar")?;
        url.query_pairs_mut()
            .append_pair("pagina", &page.to_string())
            .append_pair("porPagina", &per_page.to_string());

        let envelope: Envelope<HistoryPayload> =
            self.send_lenient(self.request(Method::GET, url)).await?;
        let payload = envelope.into_accepted("Erro ao listar histórico")?;
        let (items, total, total_pages) = match payload {
            Some(payload) => (
                payload.items.unwrap_or_default(),
                payload.total.unwrap_or(0),
                payload.total_paginas.unwrap_or(1),
            ),
            None => (Vec::new(), 0, 1),
        };
        Ok(HistoryPage {
            page,
            per_page,
            items,
            total,
            total_pages,
        })
    }
}

#[async_trait::async_trait]
impl CheckInSink for ApiClient {
    async fn check_in(&self, entries: &[CheckInEntry]) -> Result<(), ApiError> {
        let url = self.url("/api/mtr/salvar")?;
        let envelope: Envelope<Value> = self
            .send_lenient(self.request(Method::POST, url).json(entries))
            .await?;
        envelope.into_accepted("Falha ao registrar histórico")?;
        Ok(())
    }
}
