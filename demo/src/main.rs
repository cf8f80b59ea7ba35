//! Walks through a typical session: register (optional), login, two users,
//! one interaction, a text and an image input, then prints each user's
//! emotion and the free-query counter.
//!
//! Configuration comes from the environment (or a `.env` file):
//! `AEI_BASE_URL`, `AEI_USERNAME`, `AEI_PASSWORD`, and optionally
//! `AEI_REGISTER=true` (which also needs `AEI_EMAIL`), `AEI_USER1_ID`,
//! `AEI_USER2_ID`, `AEI_INTERACTION_ID` to reuse existing resources.
//!
//! Every response's status is checked before its payload is decoded, so a
//! rejected call stops the demo with the service's own error.

use aei_core::{is_success, BlockingClient, ClientConfig, Credentials, HttpResponse};
use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

const SAMPLE_TEXT: &str = "I am happy";
const SAMPLE_IMAGE: &str = "https://aei.ai/img/faces.jpg";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    let creds = Credentials::from_env()?;
    let api = BlockingClient::new(&config)?;
    let requests = api.requests();
    tracing::info!(base_url = %config.base_url, username = %creds.username, "starting demo");

    if std::env::var("AEI_REGISTER").is_ok_and(|v| v == "true") {
        let email = creds.require_email().context("AEI_REGISTER=true needs AEI_EMAIL")?;
        let resp = api.register(&creds.username, email, &creds.password, true)?;
        ensure_success(&api, &resp, "register")?;
    }

    let resp = api.login(&creds.username, &creds.password)?;
    let token = requests.parse_token(&resp).context("login failed")?.access_token;
    tracing::info!("logged in");

    let user1 = match std::env::var("AEI_USER1_ID") {
        Ok(id) => id,
        Err(_) => create_user(&api, &token)?,
    };
    let user2 = match std::env::var("AEI_USER2_ID") {
        Ok(id) => id,
        Err(_) => create_user(&api, &token)?,
    };
    println!("User1 ID: {user1}");
    println!("User2 ID: {user2}");

    let interaction = match std::env::var("AEI_INTERACTION_ID") {
        Ok(id) => id,
        Err(_) => {
            let resp = api.create_new_interaction(&[user1.as_str(), user2.as_str()], &token)?;
            ensure_success(&api, &resp, "create interaction")?;
            requests.parse_interaction(&resp)?.interaction.interaction_id
        }
    };
    println!("Interaction ID: {interaction}");

    let (user, conversation) = (Some(user1.as_str()), Some(interaction.as_str()));
    let resp = api.new_text_input(user, conversation, SAMPLE_TEXT, &token)?;
    ensure_success(&api, &resp, "text input")?;

    let resp = api.new_image_input(user, conversation, SAMPLE_IMAGE, &token)?;
    ensure_success(&api, &resp, "image input")?;

    // user2 should empathize with user1's happiness: compare pleasure scores.
    let resp = api.get_user_list(&token)?;
    ensure_success(&api, &resp, "list users")?;
    let users = requests.parse_user_list(&resp)?;
    for user in &users.users {
        let pad = &user.extra.get("affect").context("user has no affect")?["emotion"]["pad"];
        println!(
            "User[{}] Emotion PAD: ({:.2}, {:.2}, {:.2})",
            user.user_id,
            pad["pleasure"].as_f64().unwrap_or_default(),
            pad["arousal"].as_f64().unwrap_or_default(),
            pad["dominance"].as_f64().unwrap_or_default(),
        );
    }

    let resp = api.get_used_free_queries(&token)?;
    ensure_success(&api, &resp, "free queries")?;
    let queries = requests.parse_queries(&resp)?;
    println!("Free queries: {}", queries.queries);
    Ok(())
}

fn create_user(api: &BlockingClient, token: &str) -> Result<String> {
    let resp = api.create_new_user(None, token)?;
    ensure_success(api, &resp, "create user")?;
    Ok(api.requests().parse_user(&resp)?.user.user_id)
}

fn ensure_success(api: &BlockingClient, resp: &HttpResponse, step: &str) -> Result<()> {
    let status = api.requests().parse_status(resp)?;
    if !is_success(&status) {
        bail!(
            "{step} failed with status {}: {} ({})",
            status.code,
            status.error.as_deref().unwrap_or("no error message"),
            status.help.as_deref().unwrap_or("no help"),
        );
    }
    Ok(())
}
