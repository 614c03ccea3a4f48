//! Message-bus queues and the message shapes they carry.
//!
//! All fields use camelCase on the wire. `requestId` is stamped by the
//! sender and may be omitted by callers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationContext, ValidationError, Validator};

/// The closed set of queues a message can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Entity change notifications.
    DataChanges,
    /// Emails waiting to be sent.
    OutboundEmails,
    /// Search index maintenance.
    SearchIndexRequests,
    /// User data export jobs.
    UserDataAggregator,
    /// Webhook deliveries.
    WebhookExecutionRequests,
}

impl QueueName {
    /// All known queues.
    pub const ALL: [Self; 5] = [
        Self::DataChanges,
        Self::OutboundEmails,
        Self::SearchIndexRequests,
        Self::UserDataAggregator,
        Self::WebhookExecutionRequests,
    ];

    /// Returns the topic name of the queue.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataChanges => "data_changes",
            Self::OutboundEmails => "outbound_emails",
            Self::SearchIndexRequests => "search_index_requests",
            Self::UserDataAggregator => "user_data_aggregator",
            Self::WebhookExecutionRequests => "webhook_execution_requests",
        }
    }

    /// Look a queue up by topic name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == name)
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to a stored entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChangeMessage {
    /// What happened, e.g. `webhook_created`.
    pub event_type: String,
    /// The acting user.
    #[serde(default)]
    pub user_id: String,
    /// The household the change belongs to.
    #[serde(default)]
    pub household_id: String,
    /// The changed entity and any other event context.
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Correlation ID.
    #[serde(default)]
    pub request_id: String,
}

/// An email to be rendered and sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmailMessage {
    /// Destination address.
    pub recipient: String,
    /// Template name.
    pub template: String,
    /// Template variables.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Correlation ID.
    #[serde(default)]
    pub request_id: String,
}

/// What a search index request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOperation {
    /// Add or refresh the row.
    #[default]
    Index,
    /// Remove the row.
    Delete,
}

/// A request to (re)index or drop one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndexRequest {
    /// Target index.
    pub index_name: String,
    /// Row to index.
    pub row_id: String,
    /// Requested operation.
    #[serde(default)]
    pub op: IndexOperation,
    /// Correlation ID.
    #[serde(default)]
    pub request_id: String,
}

/// A request to collect everything stored about a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataAggregationRequest {
    /// The user whose data is collected.
    pub user_id: String,
    /// ID of the report to produce.
    pub report_id: String,
    /// Correlation ID.
    #[serde(default)]
    pub request_id: String,
}

/// A request to deliver one webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookExecutionRequest {
    /// Webhook to fire.
    pub webhook_id: String,
    /// Delivery body.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Correlation ID.
    #[serde(default)]
    pub request_id: String,
}

/// A message bound for one of the known queues.
///
/// Serializes as the inner message, without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueueMessage {
    /// For [`QueueName::DataChanges`].
    DataChange(DataChangeMessage),
    /// For [`QueueName::OutboundEmails`].
    OutboundEmail(OutboundEmailMessage),
    /// For [`QueueName::SearchIndexRequests`].
    SearchIndex(SearchIndexRequest),
    /// For [`QueueName::UserDataAggregator`].
    UserDataAggregation(UserDataAggregationRequest),
    /// For [`QueueName::WebhookExecutionRequests`].
    WebhookExecution(WebhookExecutionRequest),
}

impl QueueMessage {
    /// The queue this message belongs on.
    #[must_use]
    pub fn queue_name(&self) -> QueueName {
        match self {
            Self::DataChange(_) => QueueName::DataChanges,
            Self::OutboundEmail(_) => QueueName::OutboundEmails,
            Self::SearchIndex(_) => QueueName::SearchIndexRequests,
            Self::UserDataAggregation(_) => QueueName::UserDataAggregator,
            Self::WebhookExecution(_) => QueueName::WebhookExecutionRequests,
        }
    }

    /// The message's correlation ID.
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::DataChange(m) => &m.request_id,
            Self::OutboundEmail(m) => &m.request_id,
            Self::SearchIndex(m) => &m.request_id,
            Self::UserDataAggregation(m) => &m.request_id,
            Self::WebhookExecution(m) => &m.request_id,
        }
    }

    /// Overwrite the message's correlation ID.
    pub fn stamp_request_id(&mut self, request_id: impl Into<String>) {
        let slot = match self {
            Self::DataChange(m) => &mut m.request_id,
            Self::OutboundEmail(m) => &mut m.request_id,
            Self::SearchIndex(m) => &mut m.request_id,
            Self::UserDataAggregation(m) => &mut m.request_id,
            Self::WebhookExecution(m) => &mut m.request_id,
        };
        *slot = request_id.into();
    }
}

/// Input of the admin passthrough: publish `body` to `queueName`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitraryQueueMessageRequest {
    /// Target queue, by topic name.
    pub queue_name: String,
    /// Raw JSON text of the message.
    pub body: String,
}

impl Validate for ArbitraryQueueMessageRequest {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        Validator::new()
            .required("queueName", &self.queue_name)
            .required("body", &self.body)
            .finish()
    }
}

/// Output of the admin passthrough.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitraryQueueMessageResponse {
    /// Always `true`: failures are reported through the error envelope.
    pub success: bool,
}

/// Output of a user data export request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataAggregationResponse {
    /// ID of the report being produced.
    #[serde(rename = "reportID")]
    pub report_id: String,
}
