//! Generic CRUD handlers over a [`Resource`].
//!
//! One [`ResourceHandler`] serves create, read, list, update and archive for
//! a resource type, each as a straight walk through the [`Pipeline`], and
//! publishes `<name>_created`, `<name>_updated` and `<name>_archived`
//! data-change events.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use pantry_model::{
    DataError, ErrorCode, QueryFilter, QueryFilteredResult, ServiceError, SessionContext, Validate,
};

use crate::handler::handler_fn;
use crate::params::RouteParamFetcher;
use crate::pipeline::{Pipeline, PipelineCall};
use crate::router::Router;
use crate::writer::ResponseWriter;

/// Describes a household-scoped resource type.
pub trait Resource: Send + Sync + 'static {
    /// The stored record.
    type Entity: Serialize + Send + Sync + 'static;
    /// Body of a create request.
    type CreateInput: DeserializeOwned + Validate + Send + 'static;
    /// Body of an update request.
    type UpdateInput: DeserializeOwned + Validate + Send + 'static;

    /// Singular snake_case name, used for event types and span keys.
    const NAME: &'static str;
    /// Route parameter carrying the record ID, e.g. `webhookID`.
    const ID_PARAM: &'static str;

    /// Permission required to create, if any.
    const CREATE_PERMISSION: Option<&'static str> = None;
    /// Permission required to read or list, if any.
    const READ_PERMISSION: Option<&'static str> = None;
    /// Permission required to update, if any.
    const UPDATE_PERMISSION: Option<&'static str> = None;
    /// Permission required to archive, if any.
    const ARCHIVE_PERMISSION: Option<&'static str> = None;

    /// Apply an update to a stored record.
    fn apply_update(entity: &mut Self::Entity, input: Self::UpdateInput);
}

/// Data manager for one resource type.
///
/// Every method reports a missing record as [`DataError::NotFound`].
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync + 'static {
    /// Fetch one record.
    async fn get(&self, household_id: &str, id: &str) -> Result<R::Entity, DataError>;
    /// Fetch one page of records.
    async fn list(
        &self,
        household_id: &str,
        filter: &QueryFilter,
    ) -> Result<QueryFilteredResult<R::Entity>, DataError>;
    /// Whether a record exists.
    async fn exists(&self, household_id: &str, id: &str) -> Result<bool, DataError>;
    /// Create a record owned by the session's user and household.
    async fn create(&self, session: &SessionContext, input: R::CreateInput) -> Result<R::Entity, DataError>;
    /// Persist an updated record.
    async fn update(&self, household_id: &str, entity: &R::Entity) -> Result<(), DataError>;
    /// Archive a record.
    async fn archive(&self, household_id: &str, id: &str) -> Result<(), DataError>;
}

/// Create, read, list, update and archive handlers for `R`.
pub struct ResourceHandler<R: Resource> {
    pipeline: Pipeline,
    store: Arc<dyn ResourceStore<R>>,
    id_fetcher: RouteParamFetcher,
}

impl<R: Resource> fmt::Debug for ResourceHandler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("resource", &R::NAME)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceHandler<R> {
    /// Create handlers backed by `store`.
    pub fn new(pipeline: Pipeline, store: Arc<dyn ResourceStore<R>>) -> Self {
        Self {
            pipeline,
            store,
            id_fetcher: RouteParamFetcher::new(R::ID_PARAM),
        }
    }

    fn id_key() -> String {
        format!("{}_id", R::NAME)
    }

    fn authorize(call: &PipelineCall, permission: Option<&'static str>) -> Result<(), ServiceError> {
        permission.map_or(Ok(()), |p| call.authorize(p))
    }

    /// The data-change context for `entity`. The write already happened, so
    /// a record that cannot be rendered is reported on the span and the event
    /// goes out without it.
    fn entity_context(call: &PipelineCall, entity: &R::Entity) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(entity) {
            Ok(value) => BTreeMap::from([(R::NAME.to_owned(), value)]),
            Err(err) => {
                call.span()
                    .acknowledge_error(&err, "building data change context");
                BTreeMap::new()
            }
        }
    }

    /// Register the five routes under `collection` (e.g. `/api/v1/webhooks`).
    pub fn mount(self: &Arc<Self>, router: &mut Router, collection: &str) {
        let item = format!("{collection}/{{{}}}", R::ID_PARAM);

        let h = Arc::clone(self);
        router.route(Method::POST, collection, handler_fn(move |req, w| {
            let h = Arc::clone(&h);
            async move { h.create(req, w).await }
        }));
        let h = Arc::clone(self);
        router.route(Method::GET, collection, handler_fn(move |req, w| {
            let h = Arc::clone(&h);
            async move { h.list(req, w).await }
        }));
        let h = Arc::clone(self);
        router.route(Method::GET, &item, handler_fn(move |req, w| {
            let h = Arc::clone(&h);
            async move { h.read(req, w).await }
        }));
        let h = Arc::clone(self);
        router.route(Method::PUT, &item, handler_fn(move |req, w| {
            let h = Arc::clone(&h);
            async move { h.update(req, w).await }
        }));
        let h = Arc::clone(self);
        router.route(Method::DELETE, &item, handler_fn(move |req, w| {
            let h = Arc::clone(&h);
            async move { h.archive(req, w).await }
        }));
    }

    /// `POST`: 201 with the created record.
    pub async fn create(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("create", req, w);
        let span = call.tracing_span();
        let result = self.run_create(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run_create(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let input: R::CreateInput = call.decode()?;
        call.validate(&input)?;
        Self::authorize(call, R::CREATE_PERMISSION)?;

        let description = format!("creating {}", R::NAME);
        let created = call
            .database(&description, self.store.create(&session, input))
            .await?;

        let context = Self::entity_context(call, &created);
        call.publish_data_change(format!("{}_created", R::NAME), context)
            .await;
        call.respond(StatusCode::CREATED, &created);
        Ok(())
    }

    /// `GET` one: 200 with the record.
    pub async fn read(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("read", req, w);
        let span = call.tracing_span();
        let result = self.run_read(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run_read(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let id = call.id(&self.id_fetcher, &Self::id_key());
        Self::authorize(call, R::READ_PERMISSION)?;

        let description = format!("fetching {}", R::NAME);
        let entity = call
            .database(&description, self.store.get(&session.active_household_id, &id))
            .await?;

        call.respond(StatusCode::OK, &entity);
        Ok(())
    }

    /// `GET` collection: 200 with one page and its pagination.
    ///
    /// A store reporting `not_found` yields an empty page.
    pub async fn list(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("list", req, w);
        let span = call.tracing_span();
        let result = self.run_list(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run_list(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let filter = QueryFilter::from_query(call.parts().uri.query());
        call.span().attach("page", filter.page);
        call.span().attach("limit", filter.limit);
        Self::authorize(call, R::READ_PERMISSION)?;

        let description = format!("fetching {} list", R::NAME);
        let page = match call
            .database(&description, self.store.list(&session.active_household_id, &filter))
            .await
        {
            Ok(page) => page,
            Err(err) if err.code == ErrorCode::NotFound => QueryFilteredResult::empty(&filter),
            Err(err) => return Err(err),
        };

        call.respond_list(page);
        Ok(())
    }

    /// `PUT`: 200 with the updated record.
    pub async fn update(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("update", req, w);
        let span = call.tracing_span();
        let result = self.run_update(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run_update(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let input: R::UpdateInput = call.decode()?;
        call.validate(&input)?;
        let id = call.id(&self.id_fetcher, &Self::id_key());
        Self::authorize(call, R::UPDATE_PERMISSION)?;

        let household_id = session.active_household_id.as_str();
        let description = format!("fetching {}", R::NAME);
        let mut entity = call
            .database(&description, self.store.get(household_id, &id))
            .await?;
        R::apply_update(&mut entity, input);

        let description = format!("updating {}", R::NAME);
        call.database(&description, self.store.update(household_id, &entity))
            .await?;

        let context = Self::entity_context(call, &entity);
        call.publish_data_change(format!("{}_updated", R::NAME), context)
            .await;
        call.respond(StatusCode::OK, &entity);
        Ok(())
    }

    /// `DELETE`: 204 with no body.
    pub async fn archive(&self, req: http::Request<Bytes>, w: ResponseWriter) -> ResponseWriter {
        let mut call = self.pipeline.begin("archive", req, w);
        let span = call.tracing_span();
        let result = self.run_archive(&mut call).instrument(span).await;
        call.finish(result)
    }

    async fn run_archive(&self, call: &mut PipelineCall) -> Result<(), ServiceError> {
        let session = call.fetch_session()?;
        let id = call.id(&self.id_fetcher, &Self::id_key());
        Self::authorize(call, R::ARCHIVE_PERMISSION)?;

        let household_id = session.active_household_id.as_str();
        let description = format!("checking {} existence", R::NAME);
        let exists = call
            .database(&description, self.store.exists(household_id, &id))
            .await?;
        if !exists {
            return Err(ServiceError::not_found());
        }

        let description = format!("archiving {}", R::NAME);
        call.database(&description, self.store.archive(household_id, &id))
            .await?;

        let context = BTreeMap::from([(Self::id_key(), serde_json::Value::String(id))]);
        call.publish_data_change(format!("{}_archived", R::NAME), context)
            .await;
        call.respond_no_content();
        Ok(())
    }
}
