use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TransportError, ValidationError};
use crate::rules::RuleEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistRequest {
    pub text: String,
    pub prompt: String,
}

impl AssistRequest {
    pub fn new(text: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt: prompt.into(),
        }
    }

    /// Both fields must be non-empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::MissingText);
        }
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::MissingPrompt);
        }
        Ok(())
    }

    /// Reads a request out of an already-decoded JSON body. Fields that are
    /// missing or not strings fail validation the same way empty ones do.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingText)?;
        let prompt = value
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingPrompt)?;
        let request = Self::new(text, prompt);
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistResponse {
    pub original_text: String,
    pub modified_text: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The rewrite collaborator behind an assist session.
pub trait TextTransform {
    fn transform(&self, request: &AssistRequest) -> Result<AssistResponse, TransportError>;
}

impl TextTransform for RuleEngine {
    fn transform(&self, request: &AssistRequest) -> Result<AssistResponse, TransportError> {
        request.validate()?;
        Ok(AssistResponse {
            original_text: request.text.clone(),
            modified_text: self.rewrite(&request.text, &request.prompt),
            prompt: request.prompt.clone(),
        })
    }
}

impl<T: TextTransform + ?Sized> TextTransform for &T {
    fn transform(&self, request: &AssistRequest) -> Result<AssistResponse, TransportError> {
        (**self).transform(request)
    }
}

/// Serves one JSON request body, returning the status and JSON response body.
pub fn handle_json(transform: &impl TextTransform, body: &str) -> (u16, String) {
    match respond(transform, body) {
        Ok(json) => (200, json),
        Err(err) => {
            let body = ErrorBody {
                error: err.message.clone(),
            };
            let json = serde_json::to_string(&body)
                .unwrap_or_else(|_| r#"{"error":"Failed to process request"}"#.to_string());
            (err.status, json)
        }
    }
}

fn respond(transform: &impl TextTransform, body: &str) -> Result<String, TransportError> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        tracing::error!(%err, "undecodable assist request");
        TransportError::internal()
    })?;
    if !value.is_object() {
        tracing::error!("assist request body is not an object");
        return Err(TransportError::internal());
    }

    let request = AssistRequest::from_value(&value)?;
    let response = transform.transform(&request)?;
    serde_json::to_string(&response).map_err(|err| {
        tracing::error!(%err, "failed to encode assist response");
        TransportError::internal()
    })
}
