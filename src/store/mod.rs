pub mod mock;
pub mod remote;
pub mod traits;

pub use mock::MockStore;
pub use remote::RemoteStore;
pub use traits::{
    PropertyStore, StoreError, StoreResult, FEATURED_LIMIT, SIMILAR_LIMIT, SIMILAR_PRICE_DELTA,
};
