use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{lenient_bool, lenient_string, Envelope};
use crate::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default)]
    pub nome: Option<String>,
    pub login: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cnp: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub adm: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub nome: String,
    pub login: String,
    pub senha: String,
    pub cnp: String,
    pub adm: bool,
}

impl ApiClient {
    /// Returns the backend's confirmation message, if any.
    pub async fn create_user(&self, user: &NewUser) -> Result<Option<String>, ApiError> {
        let url = self.url("/api/mtr/usuarios/criar")?;
        let envelope: Envelope<Value> = self
            .send_lenient(self.request(Method::POST, url).json(user))
            .await?;
        let message = envelope.message.clone();
        envelope.into_accepted("Erro ao criar usuário")?;
        Ok(message)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let url = self.url("/api/mtr/usuarios/listar")?;
        let envelope: Envelope<Vec<UserRecord>> =
            self.send_checked(self.request(Method::GET, url)).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/mtr/usuarios/{id}"))?;
        let envelope: Envelope<Value> = self
            .send_lenient(self.request(Method::DELETE, url))
            .await?;
        envelope.into_accepted("Erro ao excluir usuário")?;
        Ok(())
    }
}
