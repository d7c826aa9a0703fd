//! Upstream hosted feature service: authentication, wire types and client.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{AccessToken, ClientCredentials, TokenCache};
pub use client::{ArcGisClient, FeatureService};
pub use types::{AddOutcome, Attributes, Feature, FeatureSet};
