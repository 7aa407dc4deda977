//! Service layer for the Metric Store

pub mod metric_store_service;

pub use metric_store_service::MetricStoreService;
