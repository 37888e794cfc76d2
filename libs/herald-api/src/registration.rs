//! Typed registration payloads.
//!
//! Each HTTP registration call decodes into one of these and is validated
//! before anything touches broker state.

use serde::Deserialize;

use crate::error::RegistrationError;
use crate::name::is_valid_topic;

/// `POST /groups`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRegistration {
    pub group_name: String,
}

impl GroupRegistration {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.group_name.trim().is_empty() {
            return Err(RegistrationError::new("groupName", "must not be empty"));
        }
        Ok(())
    }
}

/// `POST /topics`
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRegistration {
    pub name: String,
}

impl TopicRegistration {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if !is_valid_topic(&self.name) {
            return Err(RegistrationError::new(
                "name",
                format!("'{}' is not a valid topic name", self.name),
            ));
        }
        Ok(())
    }
}

/// `POST /topics/{topic}/subscriptions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRegistration {
    #[serde(default)]
    pub topic_name: Option<String>,
    pub name: String,
    pub endpoint: String,
}

impl SubscriptionRegistration {
    /// Validate against the topic addressed by the request path and return
    /// the topic the subscription binds to.
    ///
    /// A missing `topicName` means the path topic; a present one must agree.
    pub fn resolve_topic<'a>(&'a self, path_topic: &'a str) -> Result<&'a str, RegistrationError> {
        let topic = match self.topic_name.as_deref() {
            None | Some("") => path_topic,
            Some(t) if t == path_topic => t,
            Some(t) => {
                return Err(RegistrationError::new(
                    "topicName",
                    format!("'{t}' does not match path topic '{path_topic}'"),
                ));
            }
        };
        if !is_valid_topic(topic) {
            return Err(RegistrationError::new(
                "topicName",
                format!("'{topic}' is not a valid topic name"),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(RegistrationError::new("name", "must not be empty"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(RegistrationError::new("endpoint", "must not be empty"));
        }
        Ok(topic)
    }
}
