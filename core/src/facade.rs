//! One-call-per-operation facade: build the request, execute it once,
//! return the raw response.
//!
//! Nothing is cached between calls and the access token is passed on every
//! call. Responses come back uninterpreted, so callers must run the status
//! through `is_success` (or decode a DTO via `requests()`) themselves.

use crate::client::AeiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Attributes, UserFacet};

#[derive(Debug, Clone)]
pub struct BlockingClient<T = UreqTransport> {
    requests: AeiClient,
    transport: T,
}

impl BlockingClient<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            requests: AeiClient::new(config)?,
            transport,
        })
    }

    /// The underlying request builder, also used for typed decoding.
    pub fn requests(&self) -> &AeiClient {
        &self.requests
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(&request)
    }

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        agreed: bool,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_register(username, email, password, agreed))
    }

    /// The body should carry `access_token`; decode it with `parse_token`.
    pub fn login(&self, username: &str, password: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_login(username, password))
    }

    pub fn reset_password(&self, email: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_reset_password(email))
    }

    pub fn update_password(
        &self,
        username: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_update_password(username, reset_token, new_password))
    }

    pub fn change_password(
        &self,
        password: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_change_password(password, access_token))
    }

    pub fn create_new_user(
        &self,
        attributes: Option<&Attributes>,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_create_new_user(attributes, access_token)?)
    }

    pub fn get_user(&self, user_id: &str, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_user(user_id, access_token)?)
    }

    pub fn get_user_list(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_user_list(access_token))
    }

    pub fn get_user_facet(
        &self,
        user_id: &str,
        facet: UserFacet,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_user_facet(user_id, facet, access_token)?)
    }

    pub fn get_user_emotion(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.get_user_facet(user_id, UserFacet::Emotion, access_token)
    }

    pub fn get_user_mood(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.get_user_facet(user_id, UserFacet::Mood, access_token)
    }

    pub fn get_user_personality(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.get_user_facet(user_id, UserFacet::Personality, access_token)
    }

    pub fn get_user_satisfaction(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.get_user_facet(user_id, UserFacet::Satisfaction, access_token)
    }

    pub fn get_user_social_perception(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.get_user_facet(user_id, UserFacet::SocialPerception, access_token)
    }

    pub fn create_new_interaction(
        &self,
        user_ids: &[&str],
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_create_new_interaction(user_ids, access_token))
    }

    pub fn get_interaction(
        &self,
        interaction_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_interaction(interaction_id, access_token)?)
    }

    pub fn get_interaction_list(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_interaction_list(access_token))
    }

    pub fn add_users_to_interaction(
        &self,
        interaction_id: &str,
        user_ids: &[&str],
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(
            self.requests
                .build_add_users_to_interaction(interaction_id, user_ids, access_token)?,
        )
    }

    pub fn new_text_input(
        &self,
        user_id: Option<&str>,
        interaction_id: Option<&str>,
        text: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(
            self.requests
                .build_new_text_input(user_id, interaction_id, text, access_token),
        )
    }

    pub fn new_image_input(
        &self,
        user_id: Option<&str>,
        interaction_id: Option<&str>,
        image_url: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(
            self.requests
                .build_new_image_input(user_id, interaction_id, image_url, access_token),
        )
    }

    pub fn new_interaction_list_input(
        &self,
        json: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_new_interaction_list_input(json, access_token))
    }

    pub fn get_used_free_queries(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_used_free_queries(access_token))
    }

    pub fn get_used_paid_queries(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_used_paid_queries(access_token))
    }

    pub fn get_payment_sources(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_payment_sources(access_token))
    }

    pub fn get_payment_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_payment_source(source_id, access_token)?)
    }

    pub fn add_payment_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_add_payment_source(source_id, access_token)?)
    }

    pub fn update_source(
        &self,
        source_id: &str,
        params: Option<&Attributes>,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_update_source(source_id, params, access_token)?)
    }

    pub fn delete_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_delete_source(source_id, access_token)?)
    }

    pub fn get_subscription(&self, access_token: &str) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_get_subscription(access_token))
    }

    pub fn update_subscription(
        &self,
        subscription_type: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.send(self.requests.build_update_subscription(subscription_type, access_token))
    }
}
