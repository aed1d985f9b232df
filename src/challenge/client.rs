//! HTTP client for the remote challenge endpoint
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{ChallengeClient, ChallengeReply, ChallengeRequest, RATE_LIMITED_MESSAGE};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChallengeResponse {
    challenge_text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

pub struct HttpChallengeClient {
    http: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpChallengeClient {
    pub fn new(endpoint: Url, api_key: Option<SecretString>, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            api_key,
            timeout,
        }
    }
}

/// The `error` field of a failure body, if there is one
async fn error_message(resp: Response) -> Option<String> {
    resp.json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|e| !e.trim().is_empty())
}

impl ChallengeClient for HttpChallengeClient {
    async fn generate(&self, request: &ChallengeRequest) -> Result<ChallengeReply> {
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .timeout(self.timeout);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }
        let resp = builder.send().await.context("Network error")?;
        let status = resp.status();
        debug!("Challenge endpoint answered {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = error_message(resp)
                .await
                .unwrap_or_else(|| RATE_LIMITED_MESSAGE.to_string());
            return Ok(ChallengeReply::RateLimited(message));
        }
        if !status.is_success() {
            let message = error_message(resp)
                .await
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Ok(ChallengeReply::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let body: ChallengeResponse = resp.json().await.context("Parse error")?;
        Ok(ChallengeReply::Text(body.challenge_text))
    }
}

#[cfg(test)]
mod test {
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};

    use super::*;

    /// Serve `router` on an ephemeral port and return the endpoint URL
    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/generateChallenge")).unwrap()
    }

    fn client(endpoint: Url, api_key: Option<&str>) -> HttpChallengeClient {
        HttpChallengeClient::new(
            endpoint,
            api_key.map(|k| SecretString::from(k.to_string())),
            Duration::from_secs(5),
        )
    }

    fn request() -> ChallengeRequest {
        ChallengeRequest {
            card_term: "Overfitting".into(),
            card_definition: "Fitting noise".into(),
        }
    }

    #[tokio::test]
    async fn sends_term_and_definition_and_reads_the_challenge() {
        let router = Router::new().route(
            "/api/generateChallenge",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "challengeText": format!("{} / {} / {}", body["cardTerm"].as_str().unwrap_or_default(), body["cardDefinition"].as_str().unwrap_or_default(), auth)
                }))
            }),
        );
        let endpoint = serve(router).await;
        let reply = client(endpoint, Some("secret")).generate(&request()).await.unwrap();
        assert_eq!(
            reply,
            ChallengeReply::Text("Overfitting / Fitting noise / Bearer secret".into())
        );
    }

    #[tokio::test]
    async fn distinguishes_rate_limits_from_other_failures() {
        let router = Router::new()
            .route(
                "/limited",
                post(|| async {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({"error": "Quota used up, retry in a minute"})),
                    )
                }),
            )
            .route(
                "/limited-bare",
                post(|| async { StatusCode::TOO_MANY_REQUESTS }),
            )
            .route(
                "/broken",
                post(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "Challenge generation service is misconfigured (API key issue)."})),
                    )
                }),
            )
            .route("/bare", post(|| async { StatusCode::BAD_GATEWAY }));
        let base = serve(router).await;

        let reply = client(base.join("/limited").unwrap(), None)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(
            reply,
            ChallengeReply::RateLimited("Quota used up, retry in a minute".into())
        );

        let reply = client(base.join("/limited-bare").unwrap(), None)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(reply, ChallengeReply::RateLimited(RATE_LIMITED_MESSAGE.into()));

        let reply = client(base.join("/broken").unwrap(), None)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(
            reply,
            ChallengeReply::Rejected {
                status: 500,
                message: "Challenge generation service is misconfigured (API key issue).".into()
            }
        );

        let reply = client(base.join("/bare").unwrap(), None)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(
            reply,
            ChallengeReply::Rejected {
                status: 502,
                message: "HTTP error! status: 502".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_error() {
        let router = Router::new().route(
            "/api/generateChallenge",
            post(|| async { Json(json!({"text": "wrong shape"})) }),
        );
        let endpoint = serve(router).await;
        assert!(client(endpoint, None).generate(&request()).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let endpoint = Url::parse(&format!("http://{addr}/api/generateChallenge")).unwrap();
        let err = client(endpoint, None).generate(&request()).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("Network error"));
    }
}
