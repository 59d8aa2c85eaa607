//! HTTP API tests against a live server, driven through the SDK.

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prompthash_sdk::{ChatTurn, CreatePromptRequest, PromptHashClient, SdkError};

mod common;

use common::{config_with_upstream, start_server};

fn prompt_request(wallet: &str, title: &str, category: Option<&str>) -> CreatePromptRequest {
    CreatePromptRequest {
        image: "https://example.com/p.png".into(),
        title: title.into(),
        content: "Write a limerick about {topic}".into(),
        wallet_address: wallet.into(),
        price: 10.0,
        category: category.map(str::to_string),
    }
}

fn api_status(err: SdkError) -> (u16, String) {
    match err {
        SdkError::Api { status, error, .. } => (status, error),
        other => panic!("expected API error, got {other}"),
    }
}

#[tokio::test]
async fn test_health() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    let health = client.health().await.unwrap();
    assert_eq!(health["status"], "ok");

    let raw = client.get_raw("/health").await.unwrap();
    assert_eq!(raw.status, 200);
    server.stop().await;
}

#[tokio::test]
async fn test_register_and_login() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    let first = client.register_user("GWALLETONE", Some("alice")).await.unwrap();
    assert_eq!(first.status, 201);
    assert_eq!(first.message, "User registered successfully");
    let user = first.user.unwrap();
    assert_eq!(user.wallet_address, "gwalletone");
    assert_eq!(user.username, "alice");
    assert_eq!(user.rating, 4);

    let again = client.register_user("gWalletOne", None).await.unwrap();
    assert_eq!(again.status, 200);
    assert_eq!(again.message, "Login successful");
    assert!(again.user.is_none());

    let generated = client.register_user("GWALLETTWO", None).await.unwrap();
    assert!(generated.user.unwrap().username.starts_with("user"));

    assert_eq!(client.get_user("GWALLETONE").await.unwrap().id, user.id);
    assert_eq!(client.list_users().await.unwrap().len(), 2);
    assert_eq!(server.store.user_count(), 2);

    let (status, error) = api_status(client.get_user("GUNKNOWN").await.unwrap_err());
    assert_eq!((status, error.as_str()), (404, "User not found"));

    let raw = client.post_raw("/api/user", &json!({})).await.unwrap();
    assert_eq!(raw.status, 400);
    assert_eq!(raw.body, json!({"error": "Wallet address is required"}));
    server.stop().await;
}

#[tokio::test]
async fn test_create_prompt_validation() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    let raw = client
        .post_raw("/api/prompts", &json!({"title": "Only a title", "price": 0}))
        .await
        .unwrap();
    assert_eq!(raw.status, 400);
    assert_eq!(
        raw.body["error"],
        "Missing required fields: Image URL, Content, Wallet Address, Price"
    );

    let (status, error) = api_status(
        client
            .create_prompt(&prompt_request("GNOBODY", "Orphan", None))
            .await
            .unwrap_err(),
    );
    assert_eq!(status, 404);
    assert_eq!(error, "User not found. Please connect your wallet first.");
    server.stop().await;
}

#[tokio::test]
async fn test_create_and_query_prompts() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    client.register_user("GALICE", Some("alice")).await.unwrap();
    client.register_user("GBOB", Some("bob")).await.unwrap();

    let created = client
        .create_prompt(&prompt_request("galice", "First", Some("Music")))
        .await
        .unwrap();
    assert_eq!(created.message, "Prompt created successfully");
    assert_eq!(created.prompt.category, "Music");
    assert_eq!(created.prompt.rating, 3);
    let owner = created.prompt.owner.as_ref().unwrap();
    assert_eq!(owner.username, "alice");
    assert_eq!(owner.wallet_address, "galice");

    let defaulted = client
        .create_prompt(&prompt_request("GBOB", "Second", None))
        .await
        .unwrap();
    assert_eq!(defaulted.prompt.category, "Other");

    client
        .create_prompt(&prompt_request("GALICE", "Third", Some("Music")))
        .await
        .unwrap();

    let all = client.list_prompts(None, None).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);

    let music = client.list_prompts(Some("Music"), None).await.unwrap();
    assert_eq!(music.len(), 2);

    let bobs = client.list_prompts(None, Some("GBOB")).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].owner.as_ref().unwrap().username, "bob");

    let unknown_owner = client.list_prompts(None, Some("GNOBODY")).await.unwrap();
    assert_eq!(unknown_owner.len(), 3);
    server.stop().await;
}

#[tokio::test]
async fn test_improve_proxy() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/improve-prompt"))
        .and(header("content-type", "text/plain"))
        .and(body_string("draw a cat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"improvedPrompt": "draw a fluffy cat"})),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/improve-prompt"))
        .and(body_string("overload"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"reason": "busy"})))
        .mount(&upstream)
        .await;

    let server = start_server(config_with_upstream(&upstream.uri()), None).await;
    let client = PromptHashClient::new(&server.url());

    let improved = client.improve("draw a cat").await.unwrap();
    assert_eq!(improved["improvedPrompt"], "draw a fluffy cat");

    match client.improve("overload").await.unwrap_err() {
        SdkError::Api { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, json!({"error": "API Error", "details": {"reason": "busy"}}));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.stop().await;
}

#[tokio::test]
async fn test_improve_proxy_unreachable_gateway() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    match client.improve("anything").await.unwrap_err() {
        SdkError::Api { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body["error"], "Internal Server Error");
            assert!(body["message"].is_string());
        }
        other => panic!("unexpected error: {other}"),
    }
    server.stop().await;
}

#[tokio::test]
async fn test_chat_streams_data() {
    let upstream = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Sure, \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"here it is.\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .mount(&upstream)
        .await;

    let server = start_server(config_with_upstream(&upstream.uri()), Some("sk-test")).await;
    let client = PromptHashClient::new(&server.url());

    let reply = client
        .chat(&[
            ChatTurn { role: "user".into(), content: "Write a prompt".into() },
            ChatTurn { role: "ai".into(), content: "About what?".into() },
            ChatTurn { role: "user".into(), content: "Cats".into() },
        ])
        .await
        .unwrap();

    assert_eq!(reply.data_stream_version.as_deref(), Some("v1"));
    assert_eq!(reply.text(), "Sure, here it is.");
    assert!(reply.body.ends_with("d:{\"finishReason\":\"stop\"}\n"));

    let sent: serde_json::Value = upstream.received_requests().await.unwrap()[0]
        .body_json()
        .unwrap();
    assert_eq!(sent["stream"], true);
    assert_eq!(sent["messages"][1]["role"], "assistant");
    assert_eq!(sent["messages"][2]["role"], "user");
    server.stop().await;
}

#[tokio::test]
async fn test_chat_without_api_key() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;
    let client = PromptHashClient::new(&server.url());

    let (status, error) = api_status(
        client
            .chat(&[ChatTurn { role: "user".into(), content: "hi".into() }])
            .await
            .unwrap_err(),
    );
    assert_eq!(status, 502);
    assert!(error.contains("PROMPTHASH_TEST_LLM_KEY_UNSET"));
    server.stop().await;
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = start_server(config_with_upstream("http://127.0.0.1:9"), None).await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", server.url()))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");

    let res = reqwest::get(format!("{}/health", server.url())).await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
    server.stop().await;
}
