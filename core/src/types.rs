//! Response DTOs for the aEi API.
//!
//! # Design
//! Each envelope names the keys its operation is expected to return and
//! nothing else is required. Derived user fields (affect, personality, ...)
//! are service-defined and kept as raw JSON in `extra` so new fields never
//! break decoding. A missing required key fails with `MalformedResponse`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::Status;

/// Dict-shaped payload for user attributes and source updates.
pub type Attributes = Map<String, Value>;

/// Body returned by `/oauth/token`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Any body that carries only a status (register, inputs, password flows).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusBody {
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "interactionId")]
    pub interaction_id: String,
    #[serde(rename = "userIds", default)]
    pub user_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserEnvelope {
    pub status: Status,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserListEnvelope {
    pub status: Status,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionEnvelope {
    pub status: Status,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionListEnvelope {
    pub status: Status,
    pub interactions: Vec<Interaction>,
}

/// Free or paid query counter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueriesEnvelope {
    pub status: Status,
    pub queries: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceEnvelope {
    pub status: Status,
    pub source: PaymentSource,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceListEnvelope {
    pub status: Status,
    pub sources: Vec<PaymentSource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionEnvelope {
    pub status: Status,
    pub subscription: Subscription,
}

/// One derived field of a user, fetched from `/users/{id}/{facet}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserFacet {
    Emotion,
    Mood,
    Personality,
    Satisfaction,
    SocialPerception,
}

impl UserFacet {
    pub const ALL: [UserFacet; 5] = [
        UserFacet::Emotion,
        UserFacet::Mood,
        UserFacet::Personality,
        UserFacet::Satisfaction,
        UserFacet::SocialPerception,
    ];

    pub fn path_segment(self) -> &'static str {
        match self {
            UserFacet::Emotion => "emotion",
            UserFacet::Mood => "mood",
            UserFacet::Personality => "personality",
            UserFacet::Satisfaction => "satisfaction",
            UserFacet::SocialPerception => "social-perception",
        }
    }

    /// Body key holding the facet value.
    pub fn response_key(self) -> &'static str {
        match self {
            UserFacet::SocialPerception => "socialPerception",
            other => other.path_segment(),
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.path_segment() == segment)
    }
}

/// Decoded `/users/{id}/{facet}` body.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetEnvelope {
    pub status: Status,
    pub facet: UserFacet,
    pub value: Value,
}
