use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::types::lenient_string;
use crate::{ApiClient, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PartyPayload {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
}

/// The subset of the manifest payload the desk uses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ManifestPayload {
    #[serde(rename = "numeroMTR", default, deserialize_with = "lenient_string")]
    pub numero_mtr: Option<String>,
    #[serde(rename = "dataEmissao", default)]
    pub data_emissao: Option<String>,
    #[serde(rename = "dataRecebimento", default)]
    pub data_recebimento: Option<String>,
    #[serde(default)]
    pub gerador: Option<PartyPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ValidationPayload {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupReply {
    Accepted {
        manifest: ManifestPayload,
        validation: ValidationPayload,
    },
    /// `success: false`, a validation code of 400 or more, or no manifest at all.
    Rejected {
        message: Option<String>,
        manifest: Option<ManifestPayload>,
        validation: Option<ValidationPayload>,
    },
}

#[derive(Deserialize)]
struct LookupBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    validation: Option<ValidationPayload>,
    #[serde(default)]
    data: Option<ManifestPayload>,
}

#[async_trait::async_trait]
pub trait ManifestLookup: Send + Sync {
    /// `Err` only for transport-level failures; functional rejections are `Ok(Rejected)`.
    async fn lookup(&self, code: &str) -> Result<LookupReply, ApiError>;
}

#[async_trait::async_trait]
impl ManifestLookup for ApiClient {
    async fn lookup(&self, code: &str) -> Result<LookupReply, ApiError> {
        let url = self.url("/api/mtr/manifesto-pdf")?;
        let builder = self
            .request(Method::POST, url)
            .json(&json!({ "manifestoCodigo": code }));
        let body: LookupBody = self.send_lenient(builder).await?;
        Ok(classify(body))
    }
}

fn classify(body: LookupBody) -> LookupReply {
    let rejected_code = body
        .validation
        .as_ref()
        .and_then(|v| v.code)
        .is_some_and(|code| code >= 400);

    match (body.success, rejected_code, body.data) {
        (Some(true), false, Some(manifest)) => LookupReply::Accepted {
            manifest,
            validation: body.validation.unwrap_or_default(),
        },
        (_, _, manifest) => LookupReply::Rejected {
            message: body
                .validation
                .as_ref()
                .and_then(|v| v.message.clone())
                .or(body.message),
            manifest,
            validation: body.validation,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> LookupBody {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn high_validation_code_is_rejected_even_with_success() {
        let reply = classify(body(
            r#"{"success":true,"validation":{"code":404,"message":"não encontrado"},"data":{"numeroMTR":"1"}}"#,
        ));
        assert!(matches!(
            reply,
            LookupReply::Rejected { message: Some(ref m), manifest: Some(_), .. } if m == "não encontrado"
        ));
    }

    #[test]
    fn numeric_manifest_number_is_accepted() {
        let reply = classify(body(
            r#"{"success":true,"validation":{"code":200,"message":"ok"},"data":{"numeroMTR":1234567890,"dataEmissao":"01/10/2026"}}"#,
        ));
        match reply {
            LookupReply::Accepted { manifest, .. } => {
                assert_eq!(manifest.numero_mtr.as_deref(), Some("1234567890"));
                assert_eq!(manifest.data_emissao.as_deref(), Some("01/10/2026"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_without_data_is_rejected() {
        let reply = classify(body(r#"{"success":true,"message":"vazio"}"#));
        assert_eq!(
            reply,
            LookupReply::Rejected {
                message: Some("vazio".to_string()),
                manifest: None,
                validation: None,
            }
        );
    }
}
