//! TLS certificates for load balancer services.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::{CertificateId, LoadBalancerId};
use hcloud_core::query::QueryParams;
use hcloud_core::types::Labels;
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Origin of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    /// Uploaded by the user.
    Uploaded,
    /// Issued and renewed through Let's Encrypt.
    Managed,
}

impl std::fmt::Display for CertificateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Uploaded => "uploaded",
            Self::Managed => "managed",
        })
    }
}

/// Error of the last issuance or renewal attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateStatusError {
    /// Machine code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Issuance state of a managed certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateStatus {
    /// `pending`, `completed` or `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance: Option<String>,
    /// `scheduled`, `pending`, `failed` or `unavailable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal: Option<String>,
    /// Last error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CertificateStatusError>,
}

/// Resource a certificate is used by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateUsedBy {
    /// Resource ID.
    pub id: LoadBalancerId,
    /// Resource kind, `load_balancer`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A TLS certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate ID.
    pub id: CertificateId,
    /// Unique name.
    pub name: String,
    /// Origin.
    #[serde(rename = "type")]
    pub kind: CertificateType,
    /// PEM-encoded certificate chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// Domains covered.
    #[serde(default)]
    pub domain_names: Vec<String>,
    /// SHA-256 fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Start of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_valid_before: Option<DateTime<Utc>>,
    /// End of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_valid_after: Option<DateTime<Utc>>,
    /// Issuance state of managed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CertificateStatus>,
    /// Resources using the certificate.
    #[serde(default)]
    pub used_by: Vec<CertificateUsedBy>,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Certificate {
    /// Whether the certificate is valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (self.not_valid_before, self.not_valid_after) {
            (Some(before), Some(after)) => before <= now && now < after,
            _ => false,
        }
    }
}

impl Resource for Certificate {
    type Id = CertificateId;
    const SINGULAR: &'static str = "certificate";
    const PLURAL: &'static str = "certificates";
    const PATH: &'static str = "certificates";
}

/// Filters supported by the `/certificates` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CertificateListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by origin.
    pub kinds: Vec<CertificateType>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl CertificateListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("type", &self.kinds);
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Request body for creating a certificate.
#[derive(Debug, Clone, Serialize, Validate, PartialEq, Eq)]
pub struct CertificateCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Origin.
    #[serde(rename = "type")]
    pub kind: CertificateType,
    /// PEM certificate chain, for uploaded certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// PEM private key, for uploaded certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Domains, for managed certificates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_names: Vec<String>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

impl CertificateCreateOpts {
    /// Options for uploading an existing certificate.
    #[must_use]
    pub fn uploaded(name: impl Into<String>, certificate: String, private_key: String) -> Self {
        Self {
            name: name.into(),
            kind: CertificateType::Uploaded,
            certificate: Some(certificate),
            private_key: Some(private_key),
            domain_names: Vec::new(),
            labels: None,
        }
    }

    /// Options for requesting a managed certificate.
    #[must_use]
    pub fn managed(name: impl Into<String>, domain_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: CertificateType::Managed,
            certificate: None,
            private_key: None,
            domain_names,
            labels: None,
        }
    }

    fn check(&self) -> Result<()> {
        let complete = match self.kind {
            CertificateType::Uploaded => self.certificate.is_some() && self.private_key.is_some(),
            CertificateType::Managed => !self.domain_names.is_empty(),
        };
        if complete {
            Ok(())
        } else {
            Err(hcloud_core::Error::InvalidRequest(format!(
                "incomplete options for {} certificate",
                self.kind
            )))
        }
    }
}

/// Response of creating a certificate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CertificateCreateResult {
    /// The new certificate.
    pub certificate: Certificate,
    /// Issuance action of managed certificates.
    #[serde(default)]
    pub action: Option<Action>,
}

/// Changes to a certificate.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct CertificateUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Client for certificates.
#[derive(Debug, Clone)]
pub struct CertificateClient {
    resources: ResourceClient<Certificate>,
}

impl CertificateClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Certificate, CertificateListParams);

    /// Upload a certificate or request a managed one.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &CertificateCreateOpts) -> Result<CertificateCreateResult> {
        opts.validate()?;
        opts.check()?;
        self.resources.create(opts).await
    }

    /// Update a certificate.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(
        &self,
        id: CertificateId,
        opts: &CertificateUpdateOpts,
    ) -> Result<Certificate> {
        self.resources.update(id, opts).await
    }

    /// Delete a certificate.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: CertificateId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Retry a failed issuance or renewal of a managed certificate.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn retry_issuance(&self, id: CertificateId) -> Result<ActionResult> {
        self.resources.action::<(), _>(id, "retry", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{action_json, service};
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn managed_json() -> serde_json::Value {
        json!({
            "id": 897,
            "name": "www",
            "type": "managed",
            "domain_names": ["example.com", "www.example.com"],
            "not_valid_before": "2024-01-01T00:00:00Z",
            "not_valid_after": "2024-04-01T00:00:00Z",
            "status": {"issuance": "completed", "renewal": "unavailable", "error": null},
            "used_by": [{"id": 4711, "type": "load_balancer"}],
            "labels": {}
        })
    }

    #[test]
    fn validity_window() {
        let cert: Certificate = serde_json::from_value(managed_json()).unwrap();
        assert!(cert.is_valid_at(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!cert.is_valid_at(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()));
        assert_eq!(cert.used_by[0].id, LoadBalancerId::new(4711));
    }

    #[tokio::test]
    async fn create_managed_returns_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/certificates"))
            .and(body_json(json!({
                "name": "www",
                "type": "managed",
                "domain_names": ["example.com", "www.example.com"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "certificate": managed_json(),
                "action": action_json(14, "create_certificate")
            })))
            .mount(&server)
            .await;

        let client = CertificateClient::new(service(&server));
        let opts = CertificateCreateOpts::managed(
            "www",
            vec!["example.com".to_string(), "www.example.com".to_string()],
        );
        let result = client.create(&opts).await.unwrap();
        assert_eq!(result.certificate.kind, CertificateType::Managed);
        assert!(result.action.is_some());
    }

    #[tokio::test]
    async fn managed_without_domains_is_rejected() {
        let server = MockServer::start().await;
        let client = CertificateClient::new(service(&server));
        let opts = CertificateCreateOpts::managed("www", Vec::new());
        assert!(matches!(
            client.create(&opts).await,
            Err(hcloud_core::Error::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certificates"))
            .and(query_param("type", "managed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "certificates": [managed_json()]
            })))
            .mount(&server)
            .await;

        let client = CertificateClient::new(service(&server));
        let params = CertificateListParams {
            kinds: vec![CertificateType::Managed],
            ..CertificateListParams::default()
        };
        let (certs, _) = client
            .list(&hcloud_core::ListOpts::default(), &params)
            .await
            .unwrap();
        assert_eq!(certs.len(), 1);
    }

    #[tokio::test]
    async fn retry_issuance_posts_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/certificates/897/actions/retry"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "action": action_json(15, "issue_certificate")
            })))
            .mount(&server)
            .await;

        let client = CertificateClient::new(service(&server));
        let result = client
            .retry_issuance(CertificateId::new(897))
            .await
            .unwrap();
        assert_eq!(result.action.command, "issue_certificate");
    }
}
