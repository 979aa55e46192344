use crate::domain::model::Visit;
use crate::domain::payload::{FormPayload, RouteParams, Submitted};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Receives the navigations filter mutations produce.
pub trait Navigator: Send + Sync {
    fn visit(&self, visit: &Visit);
}

/// Request-level switches for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub preserve_scroll: bool,
    pub force_multipart: bool,
}

#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(
        &self,
        route_name: &str,
        params: &RouteParams,
        payload: &FormPayload,
        options: RequestOptions,
    ) -> Result<Submitted>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn default_headers(&self) -> &BTreeMap<String, String>;
}
