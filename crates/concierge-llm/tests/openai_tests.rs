use concierge_core::config::OpenAiSettings;
use concierge_core::error::Error;
use concierge_core::traits::AnswerGenerator;
use concierge_core::types::{FinishReason, GenerationRequest};
use concierge_llm::prompt::{system_prompt, user_content};
use concierge_llm::OpenAiChatClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> GenerationRequest {
    GenerationRequest {
        system_prompt: system_prompt("en"),
        user_content: user_content("Hotel Information:\n- Name: Demo Hotel", "What time is breakfast?"),
        max_tokens: 500,
        temperature: 0.7,
    }
}

fn client_for(server: &MockServer) -> OpenAiChatClient {
    let settings = OpenAiSettings { api_key: Some("test-key".into()), base_url: server.uri(), ..OpenAiSettings::default() };
    OpenAiChatClient::new(&settings).expect("client")
}

#[tokio::test]
async fn completion_happy_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4-turbo-preview",
            "max_tokens": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Breakfast is served from 7 to 10."},
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).generate(&request()).await.expect("generate");

    assert_eq!(result.text.as_deref(), Some("Breakfast is served from 7 to 10."));
    assert_eq!(result.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn truncated_completion_with_null_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "length"}]
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).generate(&request()).await.expect("generate");

    assert_eq!(result.text, None);
    assert_eq!(result.finish_reason, FinishReason::Length);
}

#[tokio::test]
async fn server_error_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ref m) if m.contains("503")), "got {err:?}");
}

#[tokio::test]
async fn empty_choices_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}
