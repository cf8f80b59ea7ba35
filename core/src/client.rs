//! Stateless request builder and response decoder for the aEi API.
//!
//! # Design
//! `AeiClient` holds only the normalized host and API root and carries no
//! mutable state between calls. Every operation has a `build_*` method that
//! produces an `HttpRequest`; the typed `parse_*` methods decode a response
//! body on demand. Executing the request is the job of a `Transport` (see
//! `facade`), so every wire detail here is testable without a network.
//!
//! Body encodings differ per operation (JSON, repeated form keys, raw text)
//! and are kept that way to stay wire compatible with the service.
//!
//! Resource ids become single percent-encoded path segments. An id that is
//! empty, `.` or `..` would address a different route, so builders that take
//! an id return `ApiError::InvalidArgument` for it instead of a request.

use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::encoding::{basic_credentials, bearer_header, form_body, query_string, user_id_form};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::status::Status;
use crate::types::{
    Attributes, FacetEnvelope, InteractionEnvelope, InteractionListEnvelope, QueriesEnvelope,
    SourceEnvelope, SourceListEnvelope, StatusBody, SubscriptionEnvelope, TokenResponse,
    UserEnvelope, UserFacet, UserListEnvelope,
};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";
const TEXT: &str = "text/plain; charset=utf-8";

/// Request builder for the aEi API.
#[derive(Debug, Clone)]
pub struct AeiClient {
    host: String,
    api_root: Url,
}

impl AeiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let config = config.normalized()?;
        let root = format!("{}/api/{}", config.base_url, config.api_version);
        let api_root = Url::parse(&root)
            .map_err(|e| ApiError::InvalidConfig(format!("api root `{root}`: {e}")))?;
        if api_root.cannot_be_a_base() {
            return Err(ApiError::InvalidConfig(format!("api root `{root}` cannot carry a path")));
        }
        Ok(Self {
            api_root,
            host: config.base_url,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_root(&self) -> &str {
        self.api_root.as_str()
    }

    // -----------------------------------------------------------------------
    // Account and authentication
    // -----------------------------------------------------------------------

    pub fn build_register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        agreed: bool,
    ) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/register", self.host),
            headers: vec![
                header("username", username),
                header("email", email),
                header("password", password),
                header("agreed", if agreed { "true" } else { "false" }),
            ],
            body: None,
        }
    }

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/oauth/token", self.host),
            headers: vec![
                header("Authorization", &basic_credentials(username, password)),
                header("Content-Type", FORM),
            ],
            body: Some(form_body(&[("grant_type", "client_credentials")])),
        }
    }

    pub fn build_reset_password(&self, email: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/reset-password", self.host),
            headers: vec![header("Content-Type", FORM)],
            body: Some(form_body(&[("email", email)])),
        }
    }

    pub fn build_update_password(
        &self,
        username: &str,
        reset_token: &str,
        new_password: &str,
    ) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Put,
            url: format!("{}/update-password", self.host),
            headers: vec![
                header("username", username),
                header("token", reset_token),
                header("password", new_password),
            ],
            body: None,
        }
    }

    /// The new password travels in a `password` header, matching the service.
    pub fn build_change_password(&self, password: &str, access_token: &str) -> HttpRequest {
        let mut req = self.authed(HttpMethod::Put, "/clients/password", access_token);
        req.headers.push(header("password", password));
        req
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Attributes are sent as a JSON object; an absent or empty map sends no
    /// body at all.
    pub fn build_create_new_user(
        &self,
        attributes: Option<&Attributes>,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let req = self.authed(HttpMethod::Post, "/users", access_token);
        with_json(req, attributes)
    }

    pub fn build_get_user(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_at(HttpMethod::Get, &["users", user_id], access_token)
    }

    pub fn build_get_user_list(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/users", access_token)
    }

    pub fn build_get_user_facet(
        &self,
        user_id: &str,
        facet: UserFacet,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let segments = ["users", user_id, facet.path_segment()];
        self.authed_at(HttpMethod::Get, &segments, access_token)
    }

    // -----------------------------------------------------------------------
    // Interactions
    // -----------------------------------------------------------------------

    pub fn build_create_new_interaction(
        &self,
        user_ids: &[&str],
        access_token: &str,
    ) -> HttpRequest {
        let req = self.authed(HttpMethod::Post, "/interactions", access_token);
        with_form(req, user_id_form(user_ids))
    }

    pub fn build_get_interaction(
        &self,
        interaction_id: &str,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_at(HttpMethod::Get, &["interactions", interaction_id], access_token)
    }

    pub fn build_get_interaction_list(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/interactions", access_token)
    }

    pub fn build_add_users_to_interaction(
        &self,
        interaction_id: &str,
        user_ids: &[&str],
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let segments = ["interactions", interaction_id, "users"];
        let req = self.authed_at(HttpMethod::Put, &segments, access_token)?;
        Ok(with_form(req, user_id_form(user_ids)))
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Ids go in the query string; a `None` id is left out of it.
    pub fn build_new_text_input(
        &self,
        user_id: Option<&str>,
        interaction_id: Option<&str>,
        text: &str,
        access_token: &str,
    ) -> HttpRequest {
        self.build_input("text", user_id, interaction_id, text, access_token)
    }

    /// Same shape as text input; the body is the image URL.
    pub fn build_new_image_input(
        &self,
        user_id: Option<&str>,
        interaction_id: Option<&str>,
        image_url: &str,
        access_token: &str,
    ) -> HttpRequest {
        self.build_input("image", user_id, interaction_id, image_url, access_token)
    }

    /// The interaction list is forwarded verbatim; no query parameters.
    pub fn build_new_interaction_list_input(&self, json: &str, access_token: &str) -> HttpRequest {
        let mut req = self.authed(HttpMethod::Post, "/inputs/interaction-list", access_token);
        req.headers.push(header("Content-Type", JSON));
        req.body = Some(json.to_string());
        req
    }

    fn build_input(
        &self,
        kind: &str,
        user_id: Option<&str>,
        interaction_id: Option<&str>,
        payload: &str,
        access_token: &str,
    ) -> HttpRequest {
        let mut params = Vec::with_capacity(2);
        if let Some(id) = user_id {
            params.push(("user_id", id));
        }
        if let Some(id) = interaction_id {
            params.push(("interaction_id", id));
        }
        let path = format!("/inputs/{kind}{}", query_string(&params));
        let mut req = self.authed(HttpMethod::Post, &path, access_token);
        req.headers.push(header("Content-Type", TEXT));
        req.body = Some(payload.to_string());
        req
    }

    // -----------------------------------------------------------------------
    // Usage metrics
    // -----------------------------------------------------------------------

    pub fn build_get_used_free_queries(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/metrics/queries/used", access_token)
    }

    pub fn build_get_used_paid_queries(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/metrics/queries", access_token)
    }

    // -----------------------------------------------------------------------
    // Billing
    // -----------------------------------------------------------------------

    pub fn build_get_payment_sources(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/sources", access_token)
    }

    pub fn build_get_payment_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_at(HttpMethod::Get, &["sources", source_id], access_token)
    }

    /// The source must already exist at the payment provider.
    pub fn build_add_payment_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_at(HttpMethod::Post, &["sources", source_id], access_token)
    }

    pub fn build_update_source(
        &self,
        source_id: &str,
        params: Option<&Attributes>,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let req = self.authed_at(HttpMethod::Put, &["sources", source_id], access_token)?;
        with_json(req, params)
    }

    pub fn build_delete_source(
        &self,
        source_id: &str,
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.authed_at(HttpMethod::Delete, &["sources", source_id], access_token)
    }

    pub fn build_get_subscription(&self, access_token: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, "/subscriptions", access_token)
    }

    pub fn build_update_subscription(
        &self,
        subscription_type: &str,
        access_token: &str,
    ) -> HttpRequest {
        let req = self.authed(HttpMethod::Put, "/subscriptions", access_token);
        with_form(req, form_body(&[("subscription_type", subscription_type)]))
    }

    // -----------------------------------------------------------------------
    // Response decoding
    // -----------------------------------------------------------------------

    pub fn parse_token(&self, response: &HttpResponse) -> Result<TokenResponse, ApiError> {
        response.json()
    }

    pub fn parse_status(&self, response: &HttpResponse) -> Result<Status, ApiError> {
        response.json::<StatusBody>().map(|body| body.status)
    }

    pub fn parse_user(&self, response: &HttpResponse) -> Result<UserEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_user_list(&self, response: &HttpResponse) -> Result<UserListEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_user_facet(
        &self,
        facet: UserFacet,
        response: &HttpResponse,
    ) -> Result<FacetEnvelope, ApiError> {
        let mut body: serde_json::Map<String, Value> = response.json()?;
        let status = body
            .remove("status")
            .ok_or_else(|| ApiError::MalformedResponse("missing field `status`".to_string()))?;
        let status: Status =
            serde_json::from_value(status).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        let value = body.remove(facet.response_key()).ok_or_else(|| {
            let missing = format!("missing field `{}`", facet.response_key());
            ApiError::MalformedResponse(status.annotate(missing))
        })?;
        Ok(FacetEnvelope { status, facet, value })
    }

    pub fn parse_interaction(
        &self,
        response: &HttpResponse,
    ) -> Result<InteractionEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_interaction_list(
        &self,
        response: &HttpResponse,
    ) -> Result<InteractionListEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_queries(&self, response: &HttpResponse) -> Result<QueriesEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_source(&self, response: &HttpResponse) -> Result<SourceEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_source_list(
        &self,
        response: &HttpResponse,
    ) -> Result<SourceListEnvelope, ApiError> {
        response.json()
    }

    pub fn parse_subscription(
        &self,
        response: &HttpResponse,
    ) -> Result<SubscriptionEnvelope, ApiError> {
        response.json()
    }

    /// Resource request under the API root with bearer auth. An empty token
    /// yields no `Authorization` header.
    fn authed(&self, method: HttpMethod, path: &str, access_token: &str) -> HttpRequest {
        request(method, format!("{}{path}", self.api_root), access_token)
    }

    /// Like `authed`, but each segment is percent-encoded on its own so an id
    /// can never add segments, a query or a fragment.
    fn authed_at(
        &self,
        method: HttpMethod,
        segments: &[&str],
        access_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        for segment in segments {
            if matches!(*segment, "" | "." | "..") {
                return Err(ApiError::InvalidArgument(format!(
                    "`{segment}` is not a usable id in /{}",
                    segments.join("/")
                )));
            }
        }
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::InvalidConfig(format!("api root `{}` cannot carry a path", self.api_root))
            })?
            .extend(segments);
        Ok(request(method, url.as_str().to_string(), access_token))
    }
}

fn request(method: HttpMethod, url: String, access_token: &str) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: bearer_header(access_token).into_iter().collect(),
        body: None,
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn with_form(mut req: HttpRequest, body: String) -> HttpRequest {
    req.headers.push(header("Content-Type", FORM));
    req.body = Some(body);
    req
}

fn with_json(mut req: HttpRequest, payload: Option<&Attributes>) -> Result<HttpRequest, ApiError> {
    let Some(payload) = payload.filter(|p| !p.is_empty()) else {
        return Ok(req);
    };
    let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
    req.headers.push(header("Content-Type", JSON));
    req.body = Some(body);
    Ok(req)
}
