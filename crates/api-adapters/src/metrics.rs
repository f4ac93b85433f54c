//! Prometheus counters for the comment and inbox operations.

use domains::{DomainError, Result};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
    Restore,
    Register,
    Login,
    MarkRead,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Ok,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(DomainError::Internal(_)) => Self::Failed,
            Err(_) => Self::Rejected,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: Operation,
    pub outcome: Outcome,
}

pub struct ApiMetrics {
    registry: Registry,
    operations: Family<OperationLabels, Counter>,
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("threadline");
        let operations = Family::<OperationLabels, Counter>::default();
        registry.register(
            "operations",
            "Service operations by outcome",
            operations.clone(),
        );
        Self {
            registry,
            operations,
        }
    }

    /// Counts one call of `operation`, classified by its result.
    pub fn record<T>(&self, operation: Operation, result: &Result<T>) {
        self.operations
            .get_or_create(&OperationLabels {
                operation,
                outcome: Outcome::of(result),
            })
            .inc();
    }

    pub fn count(&self, operation: Operation, outcome: Outcome) -> u64 {
        self.operations
            .get_or_create(&OperationLabels { operation, outcome })
            .get()
    }

    /// Renders the registry in the OpenMetrics text format.
    pub fn render(&self) -> std::result::Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}
