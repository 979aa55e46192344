pub mod chips;
pub mod codec;
pub mod dispatcher;
pub mod facets;
pub mod hierarchy;
pub mod page;
pub mod present;
pub mod routes;

pub use crate::domain::model::{FilterState, FilterValue, Visit};
pub use crate::domain::ports::{ConfigProvider, Dispatch, Navigator, RequestOptions};
pub use crate::utils::error::Result;
