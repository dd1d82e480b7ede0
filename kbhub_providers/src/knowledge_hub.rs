use async_trait::async_trait;
use kbhub_core::{Answer, AnsweringService, AskRequest, SessionToken, Source};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::retry::retry_with_backoff;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    persona: &'a str,
    session_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EndSessionRequest<'a> {
    session_id: Option<&'a str>,
}

/// HTTP client for the Knowledge Hub answering service.
#[derive(Debug, Clone)]
pub struct KnowledgeHubClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    teardown_delays: Vec<Duration>,
}

impl KnowledgeHubClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Creating KnowledgeHubClient for {base_url}");

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: None,
            teardown_delays: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Delays between session teardown attempts.
    #[must_use]
    pub fn with_teardown_delays(mut self, delays: Vec<Duration>) -> Self {
        self.teardown_delays = delays;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn try_end_session(&self, session: Option<&SessionToken>) -> anyhow::Result<()> {
        let body = EndSessionRequest {
            session_id: session.map(SessionToken::as_str),
        };

        self.authorize(self.client.delete(format!("{}/session", self.base_url)))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Extract an answer from a `/query` reply.
///
/// Only the `response` object is required; everything inside it is optional.
fn parse_answer(body: &Value) -> anyhow::Result<Answer> {
    let response = body
        .get("response")
        .filter(|v| v.is_object())
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing response"))?;

    let text = response["result"].as_str().unwrap_or_default().to_string();

    let sources: Vec<Source> = response["sources"]
        .as_array()
        .map(|items| items.iter().map(parse_source).collect())
        .unwrap_or_default();

    let session = body["session_id"].as_str().map(SessionToken::new);

    Ok(Answer {
        text,
        sources,
        session,
    })
}

fn parse_source(item: &Value) -> Source {
    Source {
        url: item["URL"].as_str().map(str::to_string),
        title: item["title"].as_str().map(str::to_string),
    }
}

#[async_trait]
impl AnsweringService for KnowledgeHubClient {
    async fn ask(&self, request: &AskRequest) -> anyhow::Result<Answer> {
        let body = QueryRequest {
            query: &request.question,
            persona: request.persona.as_str(),
            session_id: request.session.as_ref().map(SessionToken::as_str),
        };

        debug!(
            "Sending query to Knowledge Hub: persona={}, session={}",
            request.persona,
            request.session.is_some()
        );

        let response = self
            .authorize(self.client.post(format!("{}/query", self.base_url)))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let answer = parse_answer(&response)?;
        debug!(
            "Received answer from Knowledge Hub: {} sources",
            answer.sources.len()
        );
        Ok(answer)
    }

    async fn end_session(&self, session: Option<&SessionToken>) -> anyhow::Result<()> {
        retry_with_backoff(|| self.try_end_session(session), &self.teardown_delays).await?;

        info!("Knowledge Hub session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhub_core::Persona;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> KnowledgeHubClient {
        KnowledgeHubClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn request(question: &str, session: Option<&str>) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            persona: Persona::default(),
            session: session.map(SessionToken::new),
        }
    }

    #[tokio::test]
    async fn test_ask_parses_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_json(json!({
                "query": "What is X?",
                "persona": "none",
                "session_id": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {
                    "result": "X is Y",
                    "sources": [{"title": "Doc1"}, {"URL": "https://kb/doc2", "title": "Doc2"}]
                },
                "session_id": "abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server)
            .ask(&request("What is X?", None))
            .await
            .unwrap();

        assert_eq!(answer.text, "X is Y");
        assert_eq!(
            answer.sources,
            vec![
                Source::titled("Doc1"),
                Source::titled("Doc2").with_url("https://kb/doc2")
            ]
        );
        assert_eq!(answer.session, Some(SessionToken::new("abc123")));
    }

    #[tokio::test]
    async fn test_ask_forwards_session_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "query": "And Z?",
                "persona": "none",
                "session_id": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"result": "Z", "sources": []},
                "session_id": "abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_api_key("secret".to_string());
        let answer = client.ask(&request("And Z?", Some("abc123"))).await.unwrap();

        assert_eq!(answer.text, "Z");
    }

    #[tokio::test]
    async fn test_ask_is_permissive_about_partial_payloads() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"sources": [null, {"URL": "https://kb/raw"}]}
            })))
            .mount(&server)
            .await;

        let answer = client_for(&server)
            .ask(&request("Anything?", None))
            .await
            .unwrap();

        assert_eq!(answer.text, "");
        assert_eq!(
            answer.sources,
            vec![Source::default(), Source::default().with_url("https://kb/raw")]
        );
        assert_eq!(answer.session, None);
    }

    #[test]
    fn test_ask_missing_sources_are_empty() {
        let body = json!({"response": {"result": "ok", "sources": null}, "session_id": "s"});
        let answer = parse_answer(&body).unwrap();
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_ask_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).ask(&request("What is X?", None)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ask_fails_on_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.ask(&request("What is X?", None)).await.is_err());

        assert!(parse_answer(&json!({"session_id": "abc123"})).is_err());
        assert!(parse_answer(&json!({"response": "flat"})).is_err());
    }

    #[tokio::test]
    async fn test_end_session_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/session"))
            .and(body_json(json!({"session_id": "abc123"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let token = SessionToken::new("abc123");
        client_for(&server)
            .end_session(Some(&token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_end_session_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server)
            .with_teardown_delays(vec![Duration::from_millis(1), Duration::from_millis(1)]);

        assert!(client.end_session(None).await.is_err());
    }
}
