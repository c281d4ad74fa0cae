//! Publish and subscribe discovery configurations.
//!
//! Both configs are plain data with fluent builders and a `validate()` step
//! that the manager runs before anything is sent to the backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length in bytes of a service name, service-specific info blob, or
/// encoded match filter.
pub const MAX_FIELD_LEN: usize = 255;

/// How a publisher advertises its service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishType {
    /// Broadcast advertisements without waiting to be asked.
    #[default]
    Unsolicited,
    /// Only respond to matching active subscribers.
    Solicited,
}

/// How a subscriber looks for publishers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeType {
    /// Listen for unsolicited publishers.
    #[default]
    Passive,
    /// Transmit queries that solicited publishers respond to.
    Active,
}

/// Which matches a subscriber is told about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStyle {
    /// Report every match.
    #[default]
    All,
    /// Report only the first match.
    FirstOnly,
}

/// Configuration of a publish discovery session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Name of the advertised service.
    pub service_name: String,
    /// Opaque bytes delivered to matching subscribers.
    pub service_specific_info: Vec<u8>,
    /// Ordered filter elements a subscriber must match.
    pub match_filter: Vec<Vec<u8>>,
    /// Unsolicited or solicited advertising.
    pub publish_type: PublishType,
    /// Number of advertisements before stopping; 0 means unlimited.
    pub publish_count: u32,
    /// Session lifetime; `None` runs until destroyed.
    pub ttl: Option<Duration>,
    /// Whether the application wants a notification when the session ends.
    pub terminate_notification: bool,
}

impl PublishConfig {
    /// Start a builder for the given service name.
    pub fn builder(service_name: impl Into<String>) -> PublishConfigBuilder {
        PublishConfigBuilder {
            config: Self {
                service_name: service_name.into(),
                ..Self::default()
            },
        }
    }

    /// Check the config against the service's field limits.
    pub fn validate(&self) -> Result<()> {
        validate_common(
            &self.service_name,
            &self.service_specific_info,
            &self.match_filter,
        )
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            service_specific_info: Vec::new(),
            match_filter: Vec::new(),
            publish_type: PublishType::default(),
            publish_count: 0,
            ttl: None,
            terminate_notification: true,
        }
    }
}

/// Fluent builder for [`PublishConfig`].
#[derive(Debug, Clone)]
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl PublishConfigBuilder {
    /// Set the service-specific info blob.
    pub fn service_specific_info(mut self, info: impl Into<Vec<u8>>) -> Self {
        self.config.service_specific_info = info.into();
        self
    }

    /// Set the match filter.
    pub fn match_filter<I, B>(mut self, filter: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.config.match_filter = filter.into_iter().map(Into::into).collect();
        self
    }

    /// Set the publish type. Default: unsolicited.
    pub fn publish_type(mut self, t: PublishType) -> Self {
        self.config.publish_type = t;
        self
    }

    /// Set the advertisement count. Default: 0 (unlimited).
    pub fn publish_count(mut self, n: u32) -> Self {
        self.config.publish_count = n;
        self
    }

    /// Set the session lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    /// Enable or disable the termination notification. Default: enabled.
    pub fn terminate_notification(mut self, enabled: bool) -> Self {
        self.config.terminate_notification = enabled;
        self
    }

    /// Finish building. Validation happens when the config is submitted.
    pub fn build(self) -> PublishConfig {
        self.config
    }
}

/// Configuration of a subscribe discovery session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeConfig {
    /// Name of the service to look for.
    pub service_name: String,
    /// Opaque bytes delivered to matching publishers.
    pub service_specific_info: Vec<u8>,
    /// Ordered filter elements a publisher must match.
    pub match_filter: Vec<Vec<u8>>,
    /// Passive or active subscription.
    pub subscribe_type: SubscribeType,
    /// Number of queries before stopping; 0 means unlimited.
    pub subscribe_count: u32,
    /// Session lifetime; `None` runs until destroyed.
    pub ttl: Option<Duration>,
    /// Which matches to report.
    pub match_style: MatchStyle,
    /// Whether the application wants a notification when the session ends.
    pub terminate_notification: bool,
}

impl SubscribeConfig {
    /// Start a builder for the given service name.
    pub fn builder(service_name: impl Into<String>) -> SubscribeConfigBuilder {
        SubscribeConfigBuilder {
            config: Self {
                service_name: service_name.into(),
                ..Self::default()
            },
        }
    }

    /// Check the config against the service's field limits.
    pub fn validate(&self) -> Result<()> {
        validate_common(
            &self.service_name,
            &self.service_specific_info,
            &self.match_filter,
        )
    }
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            service_specific_info: Vec::new(),
            match_filter: Vec::new(),
            subscribe_type: SubscribeType::default(),
            subscribe_count: 0,
            ttl: None,
            match_style: MatchStyle::default(),
            terminate_notification: true,
        }
    }
}

/// Fluent builder for [`SubscribeConfig`].
#[derive(Debug, Clone)]
pub struct SubscribeConfigBuilder {
    config: SubscribeConfig,
}

impl SubscribeConfigBuilder {
    /// Set the service-specific info blob.
    pub fn service_specific_info(mut self, info: impl Into<Vec<u8>>) -> Self {
        self.config.service_specific_info = info.into();
        self
    }

    /// Set the match filter.
    pub fn match_filter<I, B>(mut self, filter: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.config.match_filter = filter.into_iter().map(Into::into).collect();
        self
    }

    /// Set the subscribe type. Default: passive.
    pub fn subscribe_type(mut self, t: SubscribeType) -> Self {
        self.config.subscribe_type = t;
        self
    }

    /// Set the query count. Default: 0 (unlimited).
    pub fn subscribe_count(mut self, n: u32) -> Self {
        self.config.subscribe_count = n;
        self
    }

    /// Set the session lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    /// Set the match style. Default: all.
    pub fn match_style(mut self, style: MatchStyle) -> Self {
        self.config.match_style = style;
        self
    }

    /// Enable or disable the termination notification. Default: enabled.
    pub fn terminate_notification(mut self, enabled: bool) -> Self {
        self.config.terminate_notification = enabled;
        self
    }

    /// Finish building. Validation happens when the config is submitted.
    pub fn build(self) -> SubscribeConfig {
        self.config
    }
}

fn validate_common(service_name: &str, ssi: &[u8], match_filter: &[Vec<u8>]) -> Result<()> {
    if service_name.is_empty() {
        return Err(Error::invalid_config("service name is empty"));
    }
    if service_name.len() > MAX_FIELD_LEN {
        return Err(Error::invalid_config(format!(
            "service name is {} bytes, limit is {MAX_FIELD_LEN}",
            service_name.len()
        )));
    }
    if let Some(c) = service_name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(Error::invalid_config(format!(
            "service name contains invalid character {c:?}"
        )));
    }
    if ssi.len() > MAX_FIELD_LEN {
        return Err(Error::invalid_config(format!(
            "service specific info is {} bytes, limit is {MAX_FIELD_LEN}",
            ssi.len()
        )));
    }

    // each element is sent length-prefixed with a single byte
    let mut encoded = 0usize;
    for element in match_filter {
        if element.len() > MAX_FIELD_LEN {
            return Err(Error::invalid_config(format!(
                "match filter element is {} bytes, limit is {MAX_FIELD_LEN}",
                element.len()
            )));
        }
        encoded += 1 + element.len();
    }
    if encoded > MAX_FIELD_LEN {
        return Err(Error::invalid_config(format!(
            "encoded match filter is {encoded} bytes, limit is {MAX_FIELD_LEN}"
        )));
    }
    Ok(())
}
