use gitlab_digest::config::OpenAiSettings;
use gitlab_digest::utils::llm::OpenAiClient;
use gitlab_digest::DigestError;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(&OpenAiSettings {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
    })
}

#[tokio::test]
async fn lists_model_ids_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"id": "gpt-4o-2024-08-06", "object": "model", "owned_by": "system"},
                {"id": "gpt-4o-mini", "object": "model", "owned_by": "system"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = client_for(&server).list_models().await.unwrap();

    assert_eq!(models, vec!["gpt-4o-2024-08-06", "gpt-4o-mini"]);
}

#[tokio::test]
async fn listing_with_bad_key_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server).list_models().await.unwrap_err();

    assert!(matches!(err, DigestError::Auth { .. }));
}
