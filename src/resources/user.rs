//! The user proxy and permission operations.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, OperationKind, QueryDefinition, RequestOptions, ResourceKind};
use crate::context::ClientContext;
use crate::feed::{FeedIterator, FeedOptions};
use crate::models::{PermissionProperties, UserProperties};
use crate::resources::{build_request, child_link, validate_id};
use crate::response::{ProxyResponse, Response};

/// A handle to one database user.
///
/// Permissions granted to a user carry resource tokens that can be handed to
/// less trusted clients in place of the account key.
#[derive(Clone)]
pub struct User {
    context: Arc<ClientContext>,
    id: String,
    database_id: String,
    link: String,
}

impl User {
    pub(crate) fn new(context: Arc<ClientContext>, database_link: &str, id: impl Into<String>) -> Self {
        let id = id.into();
        let link = child_link(database_link, ResourceKind::User, &id);
        let database_id = database_link
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            context,
            id,
            database_id,
            link,
        }
    }

    /// User id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name-based link, `dbs/{db}/users/{id}`.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    fn validate(&self) -> Result<(), CosmosError> {
        validate_id("database id", &self.database_id)?;
        validate_id("user id", &self.id)
    }

    /// Reads the user properties.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, and
    /// otherwise the errors of the response factory.
    pub async fn read(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, UserProperties>, CosmosError> {
        self.validate()?;
        let request = build_request(ResourceKind::User, OperationKind::Read, &self.link, options.as_ref());
        self.context
            .factory()
            .user(self.context.send(request, cancel), self.clone(), cancel)
            .await
    }

    /// Deletes the user and its permissions.
    ///
    /// # Errors
    ///
    /// Same as [`User::read`].
    pub async fn delete(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, UserProperties>, CosmosError> {
        self.validate()?;
        let request =
            build_request(ResourceKind::User, OperationKind::Delete, &self.link, options.as_ref());
        self.context
            .factory()
            .user(self.context.send(request, cancel), self.clone(), cancel)
            .await
    }

    /// Grants a permission to this user.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid user or
    /// permission id, and otherwise the errors of the response factory.
    pub async fn create_permission(
        &self,
        permission: &PermissionProperties,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<PermissionProperties>, CosmosError> {
        self.validate()?;
        validate_id("permission id", &permission.id)?;

        let mut request = build_request(
            ResourceKind::Permission,
            OperationKind::Create,
            &self.link,
            options.as_ref(),
        );
        request.set_body(self.context.encode(ResourceKind::Permission, permission)?);

        self.context
            .factory()
            .permission(self.context.send(request, cancel), cancel)
            .await
    }

    /// Reads one permission, including a freshly issued resource token.
    ///
    /// # Errors
    ///
    /// Same as [`User::create_permission`].
    pub async fn read_permission(
        &self,
        id: &str,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<PermissionProperties>, CosmosError> {
        self.validate()?;
        validate_id("permission id", id)?;

        let link = child_link(&self.link, ResourceKind::Permission, id);
        let request =
            build_request(ResourceKind::Permission, OperationKind::Read, &link, options.as_ref());

        self.context
            .factory()
            .permission(self.context.send(request, cancel), cancel)
            .await
    }

    /// Queries this user's permissions; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid user.
    pub fn query_permissions(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<PermissionProperties>, CosmosError> {
        self.validate()?;
        Ok(self
            .context
            .feed(ResourceKind::Permission, self.link.as_str(), query, options))
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User").field("link", &self.link).finish()
    }
}
