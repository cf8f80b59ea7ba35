//! Blocking client for the aEi.ai conversational-affect API.
//!
//! # Overview
//! `AeiClient` builds `HttpRequest` values for every API operation without
//! touching the network. `BlockingClient` pairs it with a `Transport` and
//! issues exactly one request per call, returning the raw `HttpResponse`.
//! Callers decide success with `status::is_success` and may decode typed
//! envelopes through the `parse_*` methods.
//!
//! # Design
//! - No session object: the access token is an argument of every
//!   authenticated call and nothing is cached, retried or refreshed.
//! - Configuration (`ClientConfig`, `Credentials`) is passed in explicitly.
//! - Body encodings differ per operation on purpose; they match the service.

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod facade;
pub mod http;
pub mod status;
pub mod transport;
pub mod types;

pub use client::AeiClient;
pub use config::{ClientConfig, Credentials};
pub use error::ApiError;
pub use facade::BlockingClient;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use status::{is_success, is_success_with, Status, StatusReporter, TracingReporter};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Attributes, FacetEnvelope, Interaction, InteractionEnvelope, InteractionListEnvelope,
    PaymentSource, QueriesEnvelope, SourceEnvelope, SourceListEnvelope, StatusBody, Subscription,
    SubscriptionEnvelope, TokenResponse, User, UserEnvelope, UserFacet, UserListEnvelope,
};
