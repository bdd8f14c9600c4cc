//! Server-side scripts of a container.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::clients::{
    CosmosError, OperationKind, PartitionKey, QueryDefinition, RequestOptions, ResourceKind,
};
use crate::context::ClientContext;
use crate::feed::{FeedIterator, FeedOptions};
use crate::models::{StoredProcedureProperties, TriggerProperties, UserDefinedFunctionProperties};
use crate::resources::{build_request, child_link, validate_id};
use crate::response::Response;

/// Stored procedures, triggers and user-defined functions of one container.
///
/// Script definitions are administrative metadata. The value a stored
/// procedure returns is a user payload and is decoded with the user
/// serializer.
///
/// # Example
///
/// ```rust,ignore
/// let scripts = container.scripts();
/// scripts
///     .create_stored_procedure(&StoredProcedureProperties {
///         id: "touch".into(),
///         body: "function(id) { getContext().getResponse().setBody({touched: id}); }".into(),
///         ..Default::default()
///     }, None, &cancel)
///     .await?;
///
/// let result = scripts
///     .execute_stored_procedure::<_, Touched>("touch", &"tenant-1".into(), &["order-1"], None, &cancel)
///     .await?;
/// ```
#[derive(Clone)]
pub struct Scripts {
    context: Arc<ClientContext>,
    container_link: String,
}

impl Scripts {
    pub(crate) fn new(context: Arc<ClientContext>, container_link: &str) -> Self {
        Self {
            context,
            container_link: container_link.to_string(),
        }
    }

    /// Validates the database and container ids embedded in the link.
    fn validate_container(&self) -> Result<(), CosmosError> {
        let mut segments = self.container_link.split('/');
        validate_id("database id", segments.nth(1).unwrap_or_default())?;
        validate_id("container id", segments.nth(1).unwrap_or_default())
    }

    fn validate(&self, name: &'static str, id: &str) -> Result<(), CosmosError> {
        self.validate_container()?;
        validate_id(name, id)
    }

    fn feed<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<T>, CosmosError> {
        self.validate_container()?;
        Ok(self
            .context
            .feed(kind, self.container_link.as_str(), query, options))
    }

    /// Registers a stored procedure.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, and
    /// otherwise the errors of the response factory.
    pub async fn create_stored_procedure(
        &self,
        properties: &StoredProcedureProperties,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<StoredProcedureProperties>, CosmosError> {
        self.validate("stored procedure id", &properties.id)?;
        let mut request = build_request(
            ResourceKind::StoredProcedure,
            OperationKind::Create,
            &self.container_link,
            options.as_ref(),
        );
        request.set_body(
            self.context
                .encode(ResourceKind::StoredProcedure, properties)?,
        );
        self.context
            .factory()
            .stored_procedure(self.context.send(request, cancel), cancel)
            .await
    }

    /// Reads a stored procedure definition.
    ///
    /// # Errors
    ///
    /// Same as [`Scripts::create_stored_procedure`].
    pub async fn read_stored_procedure(
        &self,
        id: &str,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<StoredProcedureProperties>, CosmosError> {
        self.validate("stored procedure id", id)?;
        let link = child_link(&self.container_link, ResourceKind::StoredProcedure, id);
        let request = build_request(
            ResourceKind::StoredProcedure,
            OperationKind::Read,
            &link,
            options.as_ref(),
        );
        self.context
            .factory()
            .stored_procedure(self.context.send(request, cancel), cancel)
            .await
    }

    /// Queries the stored procedures; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container.
    pub fn query_stored_procedures(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<StoredProcedureProperties>, CosmosError> {
        self.feed(ResourceKind::StoredProcedure, query, options)
    }

    /// Executes a stored procedure in one logical partition.
    ///
    /// `parameters` is encoded as the JSON array of procedure arguments with
    /// the user serializer; the procedure's response body is decoded into `R`
    /// with the same serializer.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id,
    /// [`CosmosError::Serialization`] if the arguments cannot be encoded or
    /// the result decoded, and otherwise the errors of the response factory.
    pub async fn execute_stored_procedure<P, R>(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        parameters: &P,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<R>, CosmosError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        self.validate("stored procedure id", id)?;
        let link = child_link(&self.container_link, ResourceKind::StoredProcedure, id);
        let mut request = build_request(
            ResourceKind::StoredProcedure,
            OperationKind::Execute,
            &link,
            options.as_ref(),
        );
        request.set_partition_key(partition_key);
        request.set_body(
            self.context
                .encode_user(ResourceKind::StoredProcedure, parameters)?,
        );
        self.context
            .factory()
            .stored_procedure_execute(self.context.send(request, cancel), cancel)
            .await
    }

    /// Registers a trigger.
    ///
    /// # Errors
    ///
    /// Same as [`Scripts::create_stored_procedure`].
    pub async fn create_trigger(
        &self,
        properties: &TriggerProperties,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<TriggerProperties>, CosmosError> {
        self.validate("trigger id", &properties.id)?;
        let mut request = build_request(
            ResourceKind::Trigger,
            OperationKind::Create,
            &self.container_link,
            options.as_ref(),
        );
        request.set_body(self.context.encode(ResourceKind::Trigger, properties)?);
        self.context
            .factory()
            .trigger(self.context.send(request, cancel), cancel)
            .await
    }

    /// Reads a trigger definition.
    ///
    /// # Errors
    ///
    /// Same as [`Scripts::create_stored_procedure`].
    pub async fn read_trigger(
        &self,
        id: &str,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<TriggerProperties>, CosmosError> {
        self.validate("trigger id", id)?;
        let link = child_link(&self.container_link, ResourceKind::Trigger, id);
        let request =
            build_request(ResourceKind::Trigger, OperationKind::Read, &link, options.as_ref());
        self.context
            .factory()
            .trigger(self.context.send(request, cancel), cancel)
            .await
    }

    /// Queries the triggers; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container.
    pub fn query_triggers(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<TriggerProperties>, CosmosError> {
        self.feed(ResourceKind::Trigger, query, options)
    }

    /// Registers a user-defined function.
    ///
    /// # Errors
    ///
    /// Same as [`Scripts::create_stored_procedure`].
    pub async fn create_user_defined_function(
        &self,
        properties: &UserDefinedFunctionProperties,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<UserDefinedFunctionProperties>, CosmosError> {
        self.validate("user-defined function id", &properties.id)?;
        let mut request = build_request(
            ResourceKind::UserDefinedFunction,
            OperationKind::Create,
            &self.container_link,
            options.as_ref(),
        );
        request.set_body(
            self.context
                .encode(ResourceKind::UserDefinedFunction, properties)?,
        );
        self.context
            .factory()
            .user_defined_function(self.context.send(request, cancel), cancel)
            .await
    }

    /// Reads a user-defined function definition.
    ///
    /// # Errors
    ///
    /// Same as [`Scripts::create_stored_procedure`].
    pub async fn read_user_defined_function(
        &self,
        id: &str,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<UserDefinedFunctionProperties>, CosmosError> {
        self.validate("user-defined function id", id)?;
        let link = child_link(&self.container_link, ResourceKind::UserDefinedFunction, id);
        let request = build_request(
            ResourceKind::UserDefinedFunction,
            OperationKind::Read,
            &link,
            options.as_ref(),
        );
        self.context
            .factory()
            .user_defined_function(self.context.send(request, cancel), cancel)
            .await
    }

    /// Queries the user-defined functions; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container.
    pub fn query_user_defined_functions(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<UserDefinedFunctionProperties>, CosmosError> {
        self.feed(ResourceKind::UserDefinedFunction, query, options)
    }
}

impl fmt::Debug for Scripts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scripts")
            .field("container_link", &self.container_link)
            .finish()
    }
}
