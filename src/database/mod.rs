pub mod manager;
pub mod pg;
pub mod store;

pub use pg::PgStore;
pub use store::{Datastore, ListQuery, Row, SortDirection, StoreError};
