//! Resource links and identifier validation.
//!
//! Resources are addressed by name-based links built from their ancestors'
//! ids, for example `dbs/shop/colls/orders/docs/order-1`:
//!
//! ```rust
//! use cosmos_client::clients::ResourceKind;
//! use cosmos_client::resources::child_link;
//!
//! let database = child_link("", ResourceKind::Database, "shop");
//! let container = child_link(&database, ResourceKind::Container, "orders");
//! assert_eq!(container, "dbs/shop/colls/orders");
//! ```

use crate::clients::{CosmosError, ResourceKind};

const FORBIDDEN: [char; 4] = ['/', '\\', '?', '#'];

/// Checks that `id` can be used in a resource link.
///
/// # Errors
///
/// Returns [`CosmosError::InvalidArgument`] naming `name` if the id is
/// empty, ends with a space, or contains `/`, `\`, `?` or `#`.
pub fn validate_id(name: &'static str, id: &str) -> Result<(), CosmosError> {
    if id.is_empty() {
        return Err(CosmosError::invalid_argument(name, "cannot be empty"));
    }
    if id.ends_with(' ') {
        return Err(CosmosError::invalid_argument(name, "cannot end with a space"));
    }
    if let Some(c) = id.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(CosmosError::invalid_argument(
            name,
            format!("cannot contain '{c}'"),
        ));
    }
    Ok(())
}

/// Builds the link of the `kind` resource `id` under `parent`.
#[must_use]
pub fn child_link(parent: &str, kind: ResourceKind, id: &str) -> String {
    if parent.is_empty() {
        format!("{}/{id}", kind.path_segment())
    } else {
        format!("{parent}/{}/{id}", kind.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["db1", "orders-2024", "a b", "ü"] {
            assert!(validate_id("id", id).is_ok(), "{id}");
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", "a/b", "a\\b", "a?b", "a#b", "trailing "] {
            assert!(
                matches!(
                    validate_id("id", id),
                    Err(CosmosError::InvalidArgument { name: "id", .. })
                ),
                "{id:?}"
            );
        }
    }

    #[test]
    fn test_nested_links() {
        let container = child_link("dbs/shop", ResourceKind::Container, "orders");
        assert_eq!(
            child_link(&container, ResourceKind::StoredProcedure, "bulk"),
            "dbs/shop/colls/orders/sprocs/bulk"
        );
        assert_eq!(
            child_link("dbs/shop/users/alice", ResourceKind::Permission, "read-orders"),
            "dbs/shop/users/alice/permissions/read-orders"
        );
    }
}
