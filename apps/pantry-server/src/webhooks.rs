//! Webhooks: household-owned callbacks fired on data changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{HouseholdStore, new_identifier};
use pantry_http::{Resource, ResourceStore};
use pantry_model::permissions::{ARCHIVE_WEBHOOKS, CREATE_WEBHOOKS, READ_WEBHOOKS, UPDATE_WEBHOOKS};
use pantry_model::{
    DataError, QueryFilter, QueryFilteredResult, SessionContext, SortOrder, Validate,
    ValidationContext, ValidationError, Validator,
};

const METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
const CONTENT_TYPES: &[&str] = &["application/json", "application/xml"];

/// A registered webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Content type of the delivered payload.
    pub content_type: String,
    /// Delivery target.
    pub url: String,
    /// HTTP method used for delivery.
    pub method: String,
    /// Event types that trigger delivery.
    pub events: Vec<String>,
    /// Data types that trigger delivery.
    pub data_types: Vec<String>,
    /// Free-form topics.
    pub topics: Vec<String>,
    /// Owning household.
    #[serde(rename = "belongsToHousehold")]
    pub household_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Archival time.
    pub archived_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/v1/webhooks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreationInput {
    /// Display name.
    pub name: String,
    /// Content type of the delivered payload.
    #[serde(default)]
    pub content_type: String,
    /// Delivery target.
    pub url: String,
    /// HTTP method used for delivery.
    pub method: String,
    /// Event types that trigger delivery.
    #[serde(default)]
    pub events: Vec<String>,
    /// Data types that trigger delivery.
    #[serde(default)]
    pub data_types: Vec<String>,
    /// Free-form topics.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Validate for WebhookCreationInput {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        Validator::new()
            .required("name", &self.name)
            .url("url", &self.url)
            .one_of("method", &self.method, METHODS)
            .one_of("contentType", &self.content_type, CONTENT_TYPES)
            .not_empty("events", &self.events)
            .finish()
    }
}

/// Body of `PUT /api/v1/webhooks/{webhookID}`. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookUpdateInput {
    /// New display name.
    pub name: Option<String>,
    /// New payload content type.
    pub content_type: Option<String>,
    /// New delivery target.
    pub url: Option<String>,
    /// New delivery method.
    pub method: Option<String>,
    /// New triggering events.
    pub events: Option<Vec<String>>,
    /// New triggering data types.
    pub data_types: Option<Vec<String>>,
    /// New topics.
    pub topics: Option<Vec<String>>,
}

impl Validate for WebhookUpdateInput {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v = v.required("name", name);
        }
        if let Some(url) = &self.url {
            v = v.url("url", url);
        }
        if let Some(method) = &self.method {
            v = v.one_of("method", method, METHODS);
        }
        if let Some(content_type) = &self.content_type {
            v = v.one_of("contentType", content_type, CONTENT_TYPES);
        }
        if let Some(events) = &self.events {
            v = v.not_empty("events", events);
        }
        v.finish()
    }
}

/// [`Resource`] description of webhooks.
#[derive(Debug, Clone, Copy)]
pub struct WebhookResource;

impl Resource for WebhookResource {
    type Entity = Webhook;
    type CreateInput = WebhookCreationInput;
    type UpdateInput = WebhookUpdateInput;

    const NAME: &'static str = "webhook";
    const ID_PARAM: &'static str = "webhookID";

    const CREATE_PERMISSION: Option<&'static str> = Some(CREATE_WEBHOOKS);
    const READ_PERMISSION: Option<&'static str> = Some(READ_WEBHOOKS);
    const UPDATE_PERMISSION: Option<&'static str> = Some(UPDATE_WEBHOOKS);
    const ARCHIVE_PERMISSION: Option<&'static str> = Some(ARCHIVE_WEBHOOKS);

    fn apply_update(entity: &mut Webhook, input: WebhookUpdateInput) {
        if let Some(name) = input.name {
            entity.name = name;
        }
        if let Some(content_type) = input.content_type {
            entity.content_type = content_type;
        }
        if let Some(url) = input.url {
            entity.url = url;
        }
        if let Some(method) = input.method {
            entity.method = method;
        }
        if let Some(events) = input.events {
            entity.events = events;
        }
        if let Some(data_types) = input.data_types {
            entity.data_types = data_types;
        }
        if let Some(topics) = input.topics {
            entity.topics = topics;
        }
        entity.last_updated_at = Some(Utc::now());
    }
}

/// Webhooks kept in memory, partitioned by household.
///
/// Archived webhooks stay stored but are invisible to reads unless a list
/// asks for them.
#[derive(Debug, Default)]
pub struct InMemoryWebhookStore {
    webhooks: HouseholdStore<Webhook>,
}

impl InMemoryWebhookStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self, household_id: &str, id: &str) -> Option<Webhook> {
        self.webhooks
            .get(household_id, id)
            .filter(|w| w.archived_at.is_none())
            .map(|w| (*w).clone())
    }
}

#[async_trait]
impl ResourceStore<WebhookResource> for InMemoryWebhookStore {
    async fn get(&self, household_id: &str, id: &str) -> Result<Webhook, DataError> {
        self.live(household_id, id).ok_or(DataError::NotFound)
    }

    async fn list(
        &self,
        household_id: &str,
        filter: &QueryFilter,
    ) -> Result<QueryFilteredResult<Webhook>, DataError> {
        let mut webhooks: Vec<Webhook> = self
            .webhooks
            .values(household_id)
            .iter()
            .filter(|w| filter.include_archived || w.archived_at.is_none())
            .filter(|w| filter.matches(w.created_at, w.last_updated_at))
            .map(|w| (**w).clone())
            .collect();

        webhooks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if filter.sort_by == SortOrder::Desc {
            webhooks.reverse();
        }
        Ok(filter.paginate(webhooks))
    }

    async fn exists(&self, household_id: &str, id: &str) -> Result<bool, DataError> {
        Ok(self.live(household_id, id).is_some())
    }

    async fn create(
        &self,
        session: &SessionContext,
        input: WebhookCreationInput,
    ) -> Result<Webhook, DataError> {
        let webhook = Webhook {
            id: new_identifier(),
            name: input.name,
            content_type: input.content_type,
            url: input.url,
            method: input.method,
            events: input.events,
            data_types: input.data_types,
            topics: input.topics,
            household_id: session.active_household_id.clone(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };
        self.webhooks
            .insert(&webhook.household_id, &webhook.id, webhook.clone());
        tracing::debug!(webhook_id = %webhook.id, household_id = %webhook.household_id, "webhook created");
        Ok(webhook)
    }

    async fn update(&self, household_id: &str, entity: &Webhook) -> Result<(), DataError> {
        if self.live(household_id, &entity.id).is_none() {
            return Err(DataError::NotFound);
        }
        self.webhooks.insert(household_id, &entity.id, entity.clone());
        Ok(())
    }

    async fn archive(&self, household_id: &str, id: &str) -> Result<(), DataError> {
        let mut webhook = self.live(household_id, id).ok_or(DataError::NotFound)?;
        webhook.archived_at = Some(Utc::now());
        self.webhooks.insert(household_id, id, webhook);
        Ok(())
    }
}
