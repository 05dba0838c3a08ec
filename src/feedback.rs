use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;

/// Message for the maintainers, relayed by the feedback endpoint to an
/// email provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// What the endpoint answered on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackReceipt {
    pub message: String,
    pub body: String,
}

#[derive(Deserialize)]
struct ReplyBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl FeedbackForm {
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.name.is_empty() {
            return Err(FeedbackError::MissingField("name"));
        }
        if self.email.is_empty() {
            return Err(FeedbackError::MissingField("email"));
        }
        if self.message.is_empty() {
            return Err(FeedbackError::MissingField("message"));
        }
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(FeedbackError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

/// Maps the endpoint's reply onto a receipt or error: 200 carries the
/// provider response, 405 means the endpoint refused the method, anything
/// else is a rejection with the server's `error` text when it sent one.
pub fn interpret_reply(status: u16, body: &str) -> Result<FeedbackReceipt, FeedbackError> {
    let parsed: Option<ReplyBody> = serde_json::from_str(body).ok();
    match status {
        200..=299 => Ok(FeedbackReceipt {
            message: parsed
                .and_then(|b| b.message)
                .unwrap_or_else(|| "Email sent successfully".to_string()),
            body: body.to_string(),
        }),
        405 => Err(FeedbackError::MethodNotAllowed),
        _ => Err(FeedbackError::Rejected(
            parsed
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP {status}")),
        )),
    }
}

#[cfg(feature = "network")]
pub fn send(endpoint: &str, form: &FeedbackForm) -> Result<FeedbackReceipt, FeedbackError> {
    form.validate()?;
    let payload =
        serde_json::to_string(form).map_err(|e| FeedbackError::Network(e.to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|e| FeedbackError::Network(e.to_string()))?;
    let response = client
        .post(endpoint)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .map_err(|e| FeedbackError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| FeedbackError::Network(e.to_string()))?;
    tracing::info!(endpoint, status, "feedback sent");
    interpret_reply(status, &body)
}

#[cfg(not(feature = "network"))]
pub fn send(_endpoint: &str, form: &FeedbackForm) -> Result<FeedbackReceipt, FeedbackError> {
    form.validate()?;
    Err(FeedbackError::NetworkDisabled)
}
