use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::types::{lenient_bool, lenient_string};
use crate::{ApiClient, ApiError, FailureKind};

/// Operator profile returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SessionUser {
    pub login: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cnp: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub adm: bool,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<SessionUser>,
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    token: Option<String>,
}

impl ApiClient {
    pub async fn login(&self, login: &str, senha: &str) -> Result<SessionUser, ApiError> {
        let url = self.url("/api/mtr/login")?;
        let builder = self
            .request(Method::POST, url)
            .json(&json!({ "login": login, "senha": senha }));
        let body: LoginBody = self.send_lenient(builder).await?;

        if body.success != Some(true) {
            return Err(ApiError::new(
                FailureKind::Rejected,
                body.message
                    .unwrap_or_else(|| "Usuário ou senha inválidos".to_string()),
            ));
        }

        // Older backends answer with just `{success: true}`.
        let mut user = body.data.or(body.user).unwrap_or_else(|| SessionUser {
            login: login.to_string(),
            ..SessionUser::default()
        });
        if user.token.is_none() {
            user.token = body.token;
        }
        Ok(user)
    }
}
