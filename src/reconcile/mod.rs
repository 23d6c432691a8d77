//! Client side of the meal diary: a query cache kept in step with the user's
//! actions ahead of the store's confirmation.

pub mod cache;
pub mod debounce;
pub mod http_store;
pub mod optimistic;
pub mod reconciler;

pub use cache::{CachedValue, QueryCache, QueryKey};
pub use debounce::{QuantityEditSession, QuantityUpdate, DEFAULT_QUIET_PERIOD};
pub use http_store::HttpMealStore;
pub use optimistic::{apply_optimistic_create, apply_optimistic_delete, rollback, PlaceholderIds, Snapshot};
pub use reconciler::{Mutation, MutationId, MutationKind, MutationState, Reconciler};
