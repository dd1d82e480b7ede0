//! Domain types shared by the client, the stores and the controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persona used when the caller has not picked one.
pub const DEFAULT_PERSONA: &str = "none";

/// Opaque session identifier issued by the Knowledge Hub.
///
/// The contents are never inspected; the token is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named answering mode, passed through to the service unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Persona(String);

impl Persona {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Persona {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Persona {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A citation attached to an answer.
///
/// Both fields are optional; a source with neither is still kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Source {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            url: None,
            title: Some(title.into()),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Best human-readable label: the title, else the URL.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.url.as_deref())
    }
}

/// One question sent to the answering service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
    pub persona: Persona,
    pub session: Option<SessionToken>,
}

/// A successful reply from the answering service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    /// May be empty if the service had nothing to say.
    pub text: String,
    pub sources: Vec<Source>,
    /// Token to adopt for the next request. `None` when the reply carried none.
    pub session: Option<SessionToken>,
}

impl Answer {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionToken) -> Self {
        self.session = Some(session);
        self
    }
}

/// What the controller does with a submission while another is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPolicy {
    /// Refuse the new submission; nothing changes.
    #[default]
    Reject,
    /// Accept it and send it once every earlier exchange has finished.
    Queue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona() {
        assert_eq!(Persona::default().as_str(), "none");
    }

    #[test]
    fn test_source_wire_names() {
        let source: Source =
            serde_json::from_str(r#"{"URL": "https://kb/doc1", "title": "Doc1"}"#).unwrap();
        assert_eq!(source.url.as_deref(), Some("https://kb/doc1"));
        assert_eq!(source.label(), Some("Doc1"));

        let bare: Source = serde_json::from_str("{}").unwrap();
        assert_eq!(bare, Source::default());
        assert_eq!(bare.label(), None);
    }

    #[test]
    fn test_source_label_falls_back_to_url() {
        let source = Source::default().with_url("https://kb/doc2");
        assert_eq!(source.label(), Some("https://kb/doc2"));
    }

    #[test]
    fn test_submission_policy_serde() {
        let policy: SubmissionPolicy = serde_json::from_str(r#""queue""#).unwrap();
        assert_eq!(policy, SubmissionPolicy::Queue);
        assert_eq!(SubmissionPolicy::default(), SubmissionPolicy::Reject);
    }
}
