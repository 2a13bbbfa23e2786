//! Remote gateway contract
//!
//! The three controller operations the console depends on. Implementations:
//! [`HttpGateway`](crate::http_client::HttpGateway) talks to a controller over HTTP,
//! [`MockGateway`](crate::mock::MockGateway) answers from memory.

use std::future::Future;

use crate::{
    Result,
    delta::SelectionDelta,
    model::{FieldInfo, ObjectInfo},
};

pub trait Gateway {
    /// Lists objects eligible for tracking.
    fn available_objects(&self) -> impl Future<Output = Result<Vec<ObjectInfo>>>;

    /// Lists trackable fields of one object.
    fn object_fields(&self, object_api_name: &str) -> impl Future<Output = Result<Vec<FieldInfo>>>;

    /// Persists a selection delta. Returns the serialized
    /// [`SaveResult`](crate::model::SaveResult); the caller parses it.
    fn save_tracked_configuration(
        &self,
        delta: &SelectionDelta,
    ) -> impl Future<Output = Result<String>>;
}
