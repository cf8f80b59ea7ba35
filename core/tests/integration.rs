//! Full client flow against the live mock server.
//!
//! # Design
//! Starts the mock service on a random port, then drives every facade
//! operation over real HTTP through `UreqTransport`, in the order a real
//! caller would: register, login, users, interaction, inputs, metrics,
//! billing, password flows.

use aei_core::{is_success, ApiError, Attributes, BlockingClient, ClientConfig, UserFacet};
use mock_server::Db;
use serde_json::json;

fn start_server() -> (String, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let db = Db::default();
    let server_db = db.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_db(listener, server_db).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), db)
}

fn login(api: &BlockingClient) -> String {
    let resp = api.register("alice", "alice@example.com", "s3cret", true).unwrap();
    assert!(is_success(&api.requests().parse_status(&resp).unwrap()));
    let resp = api.login("alice", "s3cret").unwrap();
    api.requests().parse_token(&resp).unwrap().access_token
}

#[test]
fn register_login_create_and_get_user() {
    let (base_url, _db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();
    let token = login(&api);

    let attrs: Attributes = json!({"name": "ann"}).as_object().cloned().unwrap();
    let created = api.create_new_user(Some(&attrs), &token).unwrap();
    let created = api.requests().parse_user(&created).unwrap();
    assert!(is_success(&created.status));
    let id = created.user.user_id;

    let fetched = api.get_user(&id, &token).unwrap();
    assert_eq!(fetched.status, 200);
    let fetched = api.requests().parse_user(&fetched).unwrap();
    assert_eq!(fetched.status.code, 200);
    assert_eq!(fetched.user.user_id, id);
    assert_eq!(fetched.user.extra["name"], "ann");
}

#[test]
fn conversation_flow() {
    let (base_url, _db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();
    let token = login(&api);
    let requests = api.requests();

    // Step 1: two users.
    let u1 = requests
        .parse_user(&api.create_new_user(None, &token).unwrap())
        .unwrap()
        .user
        .user_id;
    let u2 = requests
        .parse_user(&api.create_new_user(None, &token).unwrap())
        .unwrap()
        .user
        .user_id;

    // Step 2: interaction with the first, then add the second.
    let resp = api.create_new_interaction(&[u1.as_str()], &token).unwrap();
    let interaction = requests.parse_interaction(&resp).unwrap().interaction;
    assert_eq!(interaction.user_ids, vec![u1.clone()]);
    let id = interaction.interaction_id;

    let resp = api.add_users_to_interaction(&id, &[u2.as_str()], &token).unwrap();
    let interaction = requests.parse_interaction(&resp).unwrap().interaction;
    assert_eq!(interaction.user_ids, vec![u1.clone(), u2.clone()]);

    let list = requests
        .parse_interaction_list(&api.get_interaction_list(&token).unwrap())
        .unwrap();
    assert_eq!(list.interactions.len(), 1);
    let single = requests
        .parse_interaction(&api.get_interaction(&id, &token).unwrap())
        .unwrap();
    assert_eq!(single.interaction.interaction_id, id);

    // Step 3: inputs.
    let resp = api
        .new_text_input(Some(u1.as_str()), Some(id.as_str()), "I am happy", &token)
        .unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));
    let image = "https://aei.ai/img/faces.jpg";
    let resp = api
        .new_image_input(Some(u1.as_str()), Some(id.as_str()), image, &token)
        .unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));
    let resp = api
        .new_interaction_list_input(r#"[{"user":"a","text":"hello"}]"#, &token)
        .unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));

    // Missing interaction id: still sent, the service rejects it.
    let resp = api.new_text_input(Some(u1.as_str()), None, "hello", &token).unwrap();
    let status = requests.parse_status(&resp).unwrap();
    assert_eq!(status.code, 400);
    assert!(!is_success(&status));

    // Step 4: derived metrics.
    let users = requests.parse_user_list(&api.get_user_list(&token).unwrap()).unwrap();
    assert_eq!(users.users.len(), 2);
    for user in &users.users {
        let pleasure = user.extra["affect"]["emotion"]["pad"]["pleasure"].as_f64().unwrap();
        assert!(pleasure > 0.0, "{} should empathize", user.user_id);
    }

    let calls = [
        (UserFacet::Emotion, api.get_user_emotion(&u2, &token).unwrap()),
        (UserFacet::Mood, api.get_user_mood(&u2, &token).unwrap()),
        (UserFacet::Personality, api.get_user_personality(&u2, &token).unwrap()),
        (UserFacet::Satisfaction, api.get_user_satisfaction(&u2, &token).unwrap()),
        (UserFacet::SocialPerception, api.get_user_social_perception(&u2, &token).unwrap()),
    ];
    for (facet, resp) in calls {
        let env = requests.parse_user_facet(facet, &resp).unwrap();
        assert!(is_success(&env.status), "{facet:?}");
        assert!(env.value.is_object(), "{facet:?}");
    }

    // Step 5: usage counters.
    let free = requests.parse_queries(&api.get_used_free_queries(&token).unwrap()).unwrap();
    assert_eq!(free.queries, 3);
    let paid = requests.parse_queries(&api.get_used_paid_queries(&token).unwrap()).unwrap();
    assert_eq!(paid.queries, 0);
}

#[test]
fn billing_flow() {
    let (base_url, _db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();
    let token = login(&api);
    let requests = api.requests();

    let sub = requests.parse_subscription(&api.get_subscription(&token).unwrap()).unwrap();
    assert_eq!(sub.subscription.subscription_type, "free");

    let added = requests.parse_source(&api.add_payment_source("src_1", &token).unwrap()).unwrap();
    assert_eq!(added.source.id, "src_1");

    let params: Attributes = json!({"owner": "ann"}).as_object().cloned().unwrap();
    let updated = requests
        .parse_source(&api.update_source("src_1", Some(&params), &token).unwrap())
        .unwrap();
    assert_eq!(updated.source.extra["owner"], "ann");

    let one = requests.parse_source(&api.get_payment_source("src_1", &token).unwrap()).unwrap();
    assert_eq!(one.source, updated.source);
    let all = requests.parse_source_list(&api.get_payment_sources(&token).unwrap()).unwrap();
    assert_eq!(all.sources.len(), 1);

    let sub = requests
        .parse_subscription(&api.update_subscription("premium", &token).unwrap())
        .unwrap();
    assert_eq!(sub.subscription.subscription_type, "premium");

    let resp = api.delete_source("src_1", &token).unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));
    let resp = api.get_payment_source("src_1", &token).unwrap();
    let err = requests
        .parse_status(&resp)
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { code: 404, .. }));
}

#[test]
fn password_flows() {
    let (base_url, db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();
    let token = login(&api);
    let requests = api.requests();

    let resp = api.change_password("changed", &token).unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));
    assert_eq!(api.login("alice", "s3cret").unwrap().status, 401);

    let resp = api.reset_password("alice@example.com").unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));

    // The reset token normally arrives by email.
    let reset_token = db
        .blocking_read()
        .reset_tokens
        .iter()
        .find(|(_, user)| user.as_str() == "alice")
        .map(|(token, _)| token.clone())
        .unwrap();

    let resp = api.update_password("alice", &reset_token, "recovered").unwrap();
    assert!(is_success(&requests.parse_status(&resp).unwrap()));
    let resp = api.login("alice", "recovered").unwrap();
    assert!(!requests.parse_token(&resp).unwrap().access_token.is_empty());
}

#[test]
fn missing_or_bad_token_is_reported_not_raised() {
    let (base_url, _db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();

    let resp = api.get_user_list("").unwrap();
    assert_eq!(resp.status, 401);
    let status = api.requests().parse_status(&resp).unwrap();
    assert!(!is_success(&status));

    let resp = api.get_user_list("not-a-token").unwrap();
    assert_eq!(resp.status, 401);
    let err = api.requests().parse_user_list(&resp).unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
    assert!(err.to_string().contains("401: invalid access token"), "{err}");
}

#[test]
fn id_with_reserved_characters_addresses_no_other_resource() {
    let (base_url, _db) = start_server();
    let api = BlockingClient::new(&ClientConfig::new(&base_url)).unwrap();
    let token = login(&api);
    let requests = api.requests();
    let uid = requests
        .parse_user(&api.create_new_user(None, &token).unwrap())
        .unwrap()
        .user
        .user_id;

    for id in [format!("{uid}/mood"), format!("{uid}?x=1"), format!("{uid}#mood")] {
        let resp = api.get_user(&id, &token).unwrap();
        assert_eq!(resp.status, 404, "{id}");
        let status = requests.parse_status(&resp).unwrap();
        assert!(!is_success(&status), "{id}");
    }

    let err = api.get_user("", &token).unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
    let err = api.delete_source("..", &token).unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}
