//! Tool executor trait.
//!
//! The execution engine is agnostic to what an operation actually is: native
//! code, a sandboxed script, or a remote call. Everything behind this
//! contract looks the same to the scheduler.

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::types::{JsonMap, JsonValue};

/// Contract for executing one named operation.
///
/// The engine calls this exactly once per scheduled invocation; retry, if
/// desired, is the implementation's responsibility.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Executes the named tool with the provided arguments.
    async fn execute(&self, name: &str, arguments: &JsonMap)
        -> Result<JsonValue, ExecutionError>;
}

/// Adapts a plain async closure into a [`ToolExecutor`].
///
/// # Examples
///
/// ```
/// use toolfuse_core::error::ExecutionError;
/// use toolfuse_core::types::JsonMap;
/// use toolfuse_core::{FnExecutor, ToolExecutor};
///
/// let executor = FnExecutor::new(|name: String, _args: JsonMap| async move {
///     Ok::<_, ExecutionError>(serde_json::json!({ "tool": name }))
/// });
/// ```
pub struct FnExecutor<F> {
    f: F,
}

impl<F> FnExecutor<F> {
    /// Wraps a closure of `(name, arguments) -> future of result`.
    pub fn new(f: F) -> Self {
        FnExecutor { f }
    }
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnExecutor<F>
where
    F: Fn(String, JsonMap) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<JsonValue, ExecutionError>> + Send,
{
    async fn execute(
        &self,
        name: &str,
        arguments: &JsonMap,
    ) -> Result<JsonValue, ExecutionError> {
        (self.f)(name.to_string(), arguments.clone()).await
    }
}
