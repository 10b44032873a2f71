pub mod endpoints;

pub use endpoints::{feature_endpoints, EndpointGroups, EndpointKey};
