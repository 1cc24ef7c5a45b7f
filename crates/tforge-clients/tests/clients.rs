//! HTTP client tests against wiremock servers.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tforge_clients::{
    ChatModel, ChatRequest, ClientError, HfClassifier, HttpClientConfig, ImageModel, InterestFeed,
    OpenAiChat, OpenAiImages, OpenAiSpeech, PopularVideoFeed, PostSearch, RedditSearch,
    SerpApiTrends, SpeechModel, TextClassifier, XRecentSearch, YoutubeCharts, X_KEY_VAR,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> HttpClientConfig {
    HttpClientConfig::new(server.uri())
        .with_api_key("test-key")
        .with_timeout(Duration::from_secs(5))
        .with_max_retries(1)
}

#[tokio::test]
async fn chat_completion_returns_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4", "max_tokens": 150})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  A script.  "}}]
        })))
        .mount(&server)
        .await;

    let chat = OpenAiChat::new(config(&server), "gpt-4").unwrap();
    let text = assert_ok!(chat.complete(&ChatRequest::new("Write something").max_tokens(150)).await);
    assert_eq!(text, "A script.");
}

#[tokio::test]
async fn chat_without_choices_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let chat = OpenAiChat::new(config(&server), "gpt-4").unwrap();
    let err = assert_err!(chat.complete(&ChatRequest::new("hi")).await);
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn chat_client_requires_key() {
    let err = OpenAiChat::new(HttpClientConfig::new("http://localhost:1"), "gpt-4")
        .err()
        .expect("construction should fail without a key");
    assert!(matches!(err, ClientError::MissingCredential(_)));
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let chat = OpenAiChat::new(config(&server), "gpt-4").unwrap();
    let err = chat.complete(&ChatRequest::new("hi")).await.unwrap_err();
    match err {
        ClientError::RequestFailed { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn image_generation_decodes_base64() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G'];

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({"size": "1024x1024", "response_format": "b64_json"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"b64_json": STANDARD.encode(&png)}]
        })))
        .mount(&server)
        .await;

    let images = OpenAiImages::new(config(&server), "dall-e-3").unwrap();
    assert_eq!(images.generate("A retro style image").await.unwrap(), png);
}

#[tokio::test]
async fn speech_returns_audio_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
        .mount(&server)
        .await;

    let speech = OpenAiSpeech::new(config(&server), "tts-1", "alloy").unwrap();
    let audio = speech.synthesize("Hello there", "en").await.unwrap();
    assert_eq!(audio, b"ID3audio");
}

#[tokio::test]
async fn classifier_returns_top_label() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/sentiment-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "POSITIVE", "score": 0.97},
            {"label": "NEGATIVE", "score": 0.03}
        ]])))
        .mount(&server)
        .await;

    let classifier = HfClassifier::new(config(&server), "sentiment-model").unwrap();
    let top = classifier.classify("Great launch!").await.unwrap();
    assert_eq!(top.label, "POSITIVE");
    assert!((top.score - 0.97).abs() < f64::EPSILON);
}

#[tokio::test]
async fn interest_feed_extracts_timeline_values() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_trends"))
        .and(query_param("q", "space travel"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "interest_over_time": {
                "timeline_data": [
                    {"values": [{"query": "space travel", "extracted_value": 42}]},
                    {"values": [{"query": "space travel", "extracted_value": 57}]}
                ]
            }
        })))
        .mount(&server)
        .await;

    let feed = SerpApiTrends::new(config(&server)).unwrap();
    assert_eq!(feed.interest("space travel", None).await.unwrap(), vec![42.0, 57.0]);
}

#[tokio::test]
async fn popular_titles_use_row_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("chart", "mostPopular"))
        .and(query_param("regionCode", "US"))
        .and(query_param("maxResults", "5"))
        .and(query_param("key", "row-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"snippet": {"title": "Starship flight 9"}},
                {"snippet": {"title": "Cooking in orbit"}}
            ]
        })))
        .mount(&server)
        .await;

    let feed = YoutubeCharts::new(HttpClientConfig::new(server.uri())).unwrap();
    let titles = feed.popular_titles(Some("row-key")).await.unwrap();
    assert_eq!(titles, vec!["Starship flight 9", "Cooking in orbit"]);
}

#[tokio::test]
async fn popular_titles_without_any_key_fail() {
    let feed = YoutubeCharts::new(HttpClientConfig::new("http://localhost:1")).unwrap();
    let err = feed.popular_titles(None).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredential(_)));
}

#[tokio::test]
async fn x_search_returns_post_texts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .and(header("authorization", "Bearer test-key"))
        .and(query_param("query", "mars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "text": "Mars is close tonight"}]
        })))
        .mount(&server)
        .await;

    let x = XRecentSearch::new(config(&server)).unwrap();
    assert_eq!(x.search("mars", None).await.unwrap(), vec!["Mars is close tonight"]);
}

#[tokio::test]
async fn x_search_with_no_results_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})))
        .mount(&server)
        .await;

    let x = XRecentSearch::new(config(&server)).unwrap();
    assert!(x.search("obscure", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn x_search_without_any_key_names_the_env_var() {
    let x = XRecentSearch::new(HttpClientConfig::new("http://localhost:1")).unwrap();
    match x.search("mars", None).await.unwrap_err() {
        ClientError::MissingCredential(var) => assert_eq!(var, X_KEY_VAR),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(X_KEY_VAR, "X_API_KEY");
}

#[tokio::test]
async fn reddit_search_returns_titles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "mars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"children": [
                {"data": {"title": "Mars colony plans"}},
                {"data": {"title": "  "}},
                {"data": {}}
            ]}
        })))
        .mount(&server)
        .await;

    let reddit = RedditSearch::new(HttpClientConfig::new(server.uri())).unwrap();
    assert_eq!(reddit.search("mars", None).await.unwrap(), vec!["Mars colony plans"]);
}
