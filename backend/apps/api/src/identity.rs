//! Identity Resolution
//!
//! Asks the external session service who the caller is and stores the
//! answer as a `kernel::identity::Identity` request extension. Any failure
//! leaves the request anonymous; handlers that need an identity reject it.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use kernel::identity::Identity;
use std::time::Duration;

const SESSION_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    session_url: Option<String>,
}

impl IdentityClient {
    pub fn new(service_url: Option<&str>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(SESSION_TIMEOUT).build()?;
        Ok(Self {
            http,
            session_url: service_url.map(|url| format!("{url}/session")),
        })
    }

    /// Resolve the caller from its credentials, if it sent any
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let session_url = self.session_url.as_ref()?;

        let mut forwarded = HeaderMap::new();
        for name in [header::AUTHORIZATION, header::COOKIE] {
            if let Some(value) = headers.get(&name) {
                forwarded.insert(name, value.clone());
            }
        }
        if forwarded.is_empty() {
            return None;
        }

        let response = match self.http.get(session_url).headers(forwarded).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Identity service unreachable, treating caller as anonymous");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::debug!(status = response.status().as_u16(), "No session for caller");
            return None;
        }

        match response.json::<Identity>().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed identity service response");
                None
            }
        }
    }
}

/// Attach the caller's identity to the request when one resolves
pub async fn resolve_identity(
    State(client): State<IdentityClient>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = client.resolve(req.headers()).await {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use kernel::identity::{PlanTier, Role};
    use wiremock::matchers::{header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn with_bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_resolves_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .and(header_is("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "subjectId": "user-1",
                "role": "admin",
                "planTier": "business"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = IdentityClient::new(Some(&server.uri())).unwrap();

        let identity = client.resolve(&with_bearer("good")).await.unwrap();
        assert_eq!(identity, Identity::new("user-1", Role::Admin, PlanTier::Business));

        assert_eq!(client.resolve(&with_bearer("expired")).await, None);
    }

    #[tokio::test]
    async fn test_no_credentials_or_service_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = IdentityClient::new(Some(&server.uri())).unwrap();
        assert_eq!(client.resolve(&HeaderMap::new()).await, None);

        let disabled = IdentityClient::new(None).unwrap();
        assert_eq!(disabled.resolve(&with_bearer("good")).await, None);
    }

    #[tokio::test]
    async fn test_malformed_response_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = IdentityClient::new(Some(&server.uri())).unwrap();
        assert_eq!(client.resolve(&with_bearer("good")).await, None);
    }
}
