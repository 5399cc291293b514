//! REST façade over the request executor, one instance per domain
//!
//! Each domain client owns its own executor (and therefore its own request
//! statistics); the sync engine never touches the executor directly.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{ApiError, Credential, Method, RequestExecutor, RetryPolicy, Transport};

use super::{DomainClient, SyncDomain};

/// Domain client that lists records from `GET /v1/<domain>`
pub struct RestDomainClient {
    domain: SyncDomain,
    executor: RequestExecutor,
    page_size: usize,
}

impl RestDomainClient {
    pub fn new(
        domain: SyncDomain,
        base_url: impl Into<String>,
        policy: RetryPolicy,
        credential: Option<Credential>,
        page_size: usize,
    ) -> Self {
        let mut executor = RequestExecutor::new(base_url, policy);
        executor.set_credential(credential);
        Self {
            domain,
            executor,
            page_size,
        }
    }

    /// Build over an arbitrary transport (tests, custom stacks)
    pub fn with_transport(
        domain: SyncDomain,
        base_url: impl Into<String>,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
        page_size: usize,
    ) -> Self {
        Self {
            domain,
            executor: RequestExecutor::with_transport(base_url, policy, transport),
            page_size,
        }
    }

    /// The executor backing this client, for request-level reporting
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn list_path(&self) -> String {
        format!("v1/{}?page_size={}", self.domain, self.page_size)
    }

    /// Pull the record list out of the platform's response shape: either a
    /// bare array, or an object wrapping one under the domain name or
    /// `records`.
    fn unwrap_records(&self, body: Value) -> Vec<Value> {
        match body {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                let wrapped = map
                    .remove(self.domain.as_str())
                    .or_else(|| map.remove("records"));
                match wrapped {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

impl DomainClient for RestDomainClient {
    fn domain(&self) -> SyncDomain {
        self.domain
    }

    fn list_records(&self) -> Result<Vec<Value>, ApiError> {
        let response = self.executor.execute(Method::Get, &self.list_path(), None)?;
        if !response.success {
            return Err(ApiError::Internal(format!(
                "{} list returned status {}",
                self.domain, response.status
            )));
        }
        Ok(self.unwrap_records(response.body))
    }
}
