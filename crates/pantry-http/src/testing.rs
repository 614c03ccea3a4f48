//! Collaborator doubles shared by the unit tests of this crate.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use pantry_core::{HouseholdStore, new_identifier};
use pantry_model::{
    AccountStatus, DataError, PermissionSet, QueryFilter, QueryFilteredResult, QueueName, Requester,
    SessionContext, Validate, ValidationContext, ValidationError, Validator,
};

use crate::params::RouteParams;
use crate::pipeline::Pipeline;
use crate::publisher::{PublishError, Publisher, PublisherProvider};
use crate::resource::{Resource, ResourceStore};
use crate::server_io::ServerEncoderDecoder;
use crate::session::{SessionContextFetcher, SessionError};
use crate::trace::Tracer;
use crate::writer::ResponseWriter;

pub(crate) const USER_ID: &str = "user-1";
pub(crate) const HOUSEHOLD_ID: &str = "household-1";
pub(crate) const CREATE_WIDGETS: &str = "create.widgets";

/// Ordered record of collaborator calls across store and publisher.
pub(crate) type Journal = Arc<Mutex<Vec<&'static str>>>;

pub(crate) fn session_with(permissions: &[&str]) -> SessionContext {
    let household: PermissionSet = permissions.iter().copied().collect();
    SessionContext {
        requester: Requester {
            user_id: USER_ID.to_owned(),
            account_status: AccountStatus::Good,
            service_permissions: PermissionSet::empty(),
        },
        active_household_id: HOUSEHOLD_ID.to_owned(),
        household_permissions: [(HOUSEHOLD_ID.to_owned(), household)].into_iter().collect(),
    }
}

fn session_fetcher(session: Option<SessionContext>) -> Arc<dyn SessionContextFetcher> {
    Arc::new(move |_: &http::request::Parts| session.clone().ok_or(SessionError::Missing))
}

#[derive(Debug, Default)]
pub(crate) struct RecordingProvider {
    pub journal: Journal,
    pub provided: Arc<Mutex<Vec<QueueName>>>,
    pub published: Arc<Mutex<Vec<(QueueName, Bytes)>>>,
    pub fail_provide: bool,
    pub fail_publish: bool,
}

struct RecordingPublisher {
    queue: QueueName,
    journal: Journal,
    published: Arc<Mutex<Vec<(QueueName, Bytes)>>>,
    fail: bool,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, message: Bytes) -> Result<(), PublishError> {
        self.journal.lock().push("publish");
        if self.fail {
            return Err(PublishError::Transport {
                queue: self.queue,
                reason: "broker unavailable".to_owned(),
            });
        }
        self.published.lock().push((self.queue, message));
        Ok(())
    }
}

impl PublisherProvider for RecordingProvider {
    fn provide_publisher(&self, queue: QueueName) -> Result<Arc<dyn Publisher>, PublishError> {
        self.provided.lock().push(queue);
        if self.fail_provide {
            return Err(PublishError::Unavailable(queue));
        }
        Ok(Arc::new(RecordingPublisher {
            queue,
            journal: Arc::clone(&self.journal),
            published: Arc::clone(&self.published),
            fail: self.fail_publish,
        }))
    }
}

impl RecordingProvider {
    pub(crate) fn published_json(&self) -> Vec<(QueueName, serde_json::Value)> {
        self.published
            .lock()
            .iter()
            .map(|(q, b)| (*q, serde_json::from_slice(b).unwrap()))
            .collect()
    }
}

/// Everything a handler test needs.
pub(crate) struct Harness {
    pub pipeline: Pipeline,
    pub tracer: Tracer,
    pub provider: Arc<RecordingProvider>,
}

pub(crate) fn harness(session: Option<SessionContext>, provider: RecordingProvider) -> Harness {
    let tracer = Tracer::default().with_recorder();
    let provider = Arc::new(provider);
    let pipeline = Pipeline::new(
        ServerEncoderDecoder::default(),
        tracer.clone(),
        session_fetcher(session),
        Arc::clone(&provider) as Arc<dyn PublisherProvider>,
    );
    Harness {
        pipeline,
        tracer,
        provider,
    }
}

pub(crate) fn json_request(method: &str, uri: &str, body: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_owned()))
        .unwrap()
}

pub(crate) fn with_param(mut req: http::Request<Bytes>, name: &str, value: &str) -> http::Request<Bytes> {
    let mut params = RouteParams::new();
    params.insert(name, value);
    req.extensions_mut().insert(params);
    req
}

pub(crate) fn envelope(w: &ResponseWriter) -> serde_json::Value {
    serde_json::from_slice(w.body()).unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Widget {
    pub id: String,
    pub name: String,
    pub household_id: String,
    #[serde(default)]
    pub serial: u128,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WidgetInput {
    pub name: String,
}

impl Validate for WidgetInput {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        Validator::new().required("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub(crate) struct WidgetResource;

impl Resource for WidgetResource {
    type Entity = Widget;
    type CreateInput = WidgetInput;
    type UpdateInput = WidgetInput;

    const NAME: &'static str = "widget";
    const ID_PARAM: &'static str = "widgetID";
    const CREATE_PERMISSION: Option<&'static str> = Some(CREATE_WIDGETS);

    fn apply_update(entity: &mut Widget, input: WidgetInput) {
        entity.name = input.name;
    }
}

#[derive(Debug, Default)]
pub(crate) struct WidgetStore {
    pub widgets: HouseholdStore<Widget>,
    pub journal: Journal,
    pub update_not_found: bool,
    pub list_not_found: bool,
    pub broken: bool,
    /// Mint serials a JSON value cannot hold.
    pub oversized_serials: bool,
}

impl WidgetStore {
    pub(crate) fn seed(&self, id: &str, name: &str) {
        self.widgets.insert(
            HOUSEHOLD_ID,
            id,
            Widget {
                id: id.to_owned(),
                name: name.to_owned(),
                household_id: HOUSEHOLD_ID.to_owned(),
                serial: 0,
                archived: false,
            },
        );
    }

    fn live(&self, household_id: &str, id: &str) -> Option<Widget> {
        self.widgets
            .get(household_id, id)
            .filter(|w| !w.archived)
            .map(|w| (*w).clone())
    }

    fn enter(&self) -> Result<(), DataError> {
        self.journal.lock().push("database");
        if self.broken {
            return Err(DataError::other("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore<WidgetResource> for WidgetStore {
    async fn get(&self, household_id: &str, id: &str) -> Result<Widget, DataError> {
        self.enter()?;
        self.live(household_id, id).ok_or(DataError::NotFound)
    }

    async fn list(
        &self,
        household_id: &str,
        filter: &QueryFilter,
    ) -> Result<QueryFilteredResult<Widget>, DataError> {
        self.enter()?;
        if self.list_not_found {
            return Err(DataError::NotFound);
        }
        let mut widgets: Vec<Widget> = self
            .widgets
            .values(household_id)
            .iter()
            .filter(|w| !w.archived)
            .map(|w| (**w).clone())
            .collect();
        widgets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(filter.paginate(widgets))
    }

    async fn exists(&self, household_id: &str, id: &str) -> Result<bool, DataError> {
        self.enter()?;
        Ok(self.live(household_id, id).is_some())
    }

    async fn create(&self, session: &SessionContext, input: WidgetInput) -> Result<Widget, DataError> {
        self.enter()?;
        let widget = Widget {
            id: new_identifier(),
            name: input.name,
            household_id: session.active_household_id.clone(),
            serial: if self.oversized_serials { u128::MAX } else { 1 },
            archived: false,
        };
        self.widgets
            .insert(&widget.household_id, &widget.id, widget.clone());
        Ok(widget)
    }

    async fn update(&self, household_id: &str, entity: &Widget) -> Result<(), DataError> {
        self.enter()?;
        if self.update_not_found {
            return Err(DataError::NotFound);
        }
        self.widgets.insert(household_id, &entity.id, entity.clone());
        Ok(())
    }

    async fn archive(&self, household_id: &str, id: &str) -> Result<(), DataError> {
        self.enter()?;
        let mut widget = self.live(household_id, id).ok_or(DataError::NotFound)?;
        widget.archived = true;
        self.widgets.insert(household_id, id, widget);
        Ok(())
    }
}
