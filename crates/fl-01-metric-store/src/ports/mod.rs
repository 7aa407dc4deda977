//! Ports layer for the Metric Store

pub mod inbound;

pub use inbound::{ContentMetricApi, RankedEntity, UserMetricApi};
