//! Identity service

use serde::Deserialize;

use super::{decode_one, CrudService, Operation};
use crate::error::{CodecError, Result, ServiceError};
use crate::model::{Identity, Record};
use crate::net::client::{segment, SocialClient};
use crate::net::http::{AuthPolicy, HttpGateway};

/// Identities are read-only through the REST API
#[derive(Clone)]
pub struct IdentityService {
    client: SocialClient,
    http: HttpGateway,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl IdentityService {
    pub fn new(client: SocialClient) -> Self {
        Self {
            http: client.gateway(Identity::NAME),
            client,
        }
    }

    /// Resolve the identity id of a `(provider, remote id)` pair,
    /// e.g. `("organization", "demo")` or `("space", "engineering")`
    pub async fn identity_id(&self, provider_id: &str, remote_id: &str) -> Result<String> {
        let path = format!(
            "identity/{}/{}/id/show.json",
            segment(Identity::NAME, provider_id)?,
            segment(Identity::NAME, remote_id)?
        );
        let body = self.fetch(&path).await?;

        let response: IdResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::parse(Identity::NAME, CodecError::Parse(e)))?;
        Ok(response.id)
    }

    /// Fetch the identity of a `(provider, remote id)` pair
    pub async fn find(&self, provider_id: &str, remote_id: &str) -> Result<Identity> {
        let id = self.identity_id(provider_id, remote_id).await?;
        self.get(&id).await
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.client.api_url(Identity::NAME, path)?;
        let session = self.client.current_session();
        Ok(self
            .http
            .get(url.as_str(), AuthPolicy::BasicAuth, &session)
            .await?)
    }
}

impl CrudService<Identity> for IdentityService {
    const RESOURCE: &'static str = Identity::NAME;
    const SUPPORTED: &'static [Operation] = &[Operation::Get];

    async fn get(&self, id: &str) -> Result<Identity> {
        let body = self.fetch(&format!("identity/{}.json", segment(Identity::NAME, id)?)).await?;
        decode_one(Identity::NAME, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_capabilities() {
        assert!(IdentityService::supports(Operation::Get));
        assert!(!IdentityService::supports(Operation::Create));
        assert!(!IdentityService::supports(Operation::Update));
        assert!(!IdentityService::supports(Operation::Delete));
    }

    #[tokio::test]
    async fn test_unsupported_operations_fail_without_request() {
        let client = SocialClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let service = client.identities();
        let identity = Identity::new();

        let err = service.create(&identity).await.unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "identity: create is not supported");
        assert!(service.update(&identity).await.unwrap_err().is_unsupported());
        assert!(service.delete(&identity).await.unwrap_err().is_unsupported());
    }
}
