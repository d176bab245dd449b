use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::lenient_string;
use crate::{ApiClient, ApiError, FailureKind};

/// Backend tables editable from the configuration screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEntity {
    Sector,
    PaymentType,
    Category,
}

impl ConfigEntity {
    fn path(self) -> &'static str {
        match self {
            ConfigEntity::Sector => "/setor",
            ConfigEntity::PaymentType => "/pagamento",
            ConfigEntity::Category => "/categoria",
        }
    }

    /// JSON field holding the display name.
    fn field(self) -> &'static str {
        match self {
            ConfigEntity::Sector => "setor",
            ConfigEntity::PaymentType => "tipo",
            ConfigEntity::Category => "categoria",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

impl ApiClient {
    pub async fn list_config(&self, entity: ConfigEntity) -> Result<Vec<ConfigEntry>, ApiError> {
        let url = self.url(entity.path())?;
        let rows: Option<Vec<Map<String, Value>>> =
            self.send_checked(self.request(Method::GET, url)).await?;
        rows.unwrap_or_default()
            .iter()
            .map(|row| entry_from_row(entity, row))
            .collect()
    }

    /// Creates when `id` is `None`, otherwise renames the existing row.
    pub async fn save_config(
        &self,
        entity: ConfigEntity,
        id: Option<u64>,
        name: &str,
    ) -> Result<SaveReceipt, ApiError> {
        let mut body = Map::new();
        body.insert(entity.field().to_string(), Value::String(name.to_string()));
        let builder = match id {
            Some(id) => self.request(Method::PUT, self.url(&format!("{}/{id}", entity.path()))?),
            None => self.request(Method::POST, self.url(entity.path())?),
        };
        let receipt: Option<SaveReceipt> = self.send_checked(builder.json(&body)).await?;
        Ok(receipt.unwrap_or_default())
    }

    pub async fn delete_config(&self, entity: ConfigEntity, id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/{id}", entity.path()))?;
        let _: Value = self.send_checked(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

fn entry_from_row(entity: ConfigEntity, row: &Map<String, Value>) -> Result<ConfigEntry, ApiError> {
    let id = row.get("id").and_then(Value::as_u64).ok_or_else(|| {
        ApiError::new(FailureKind::Decode, format!("{} row without numeric id", entity.field()))
    })?;
    let name = row
        .get(entity.field())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(ConfigEntry { id, name })
}
