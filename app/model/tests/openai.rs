//! Tests for the OpenAI-compatible request builder and frame parser.

use quill_model::{Frame, Prompt, ProviderKind, ProviderRecord, StreamError, openai};

fn record(base_url: &str, api_key: &str) -> ProviderRecord {
    ProviderRecord {
        kind: ProviderKind::OpenAi,
        base_url: base_url.to_owned(),
        api_key: api_key.to_owned(),
        model: "gpt-4o".into(),
        context_window: None,
        api_version: None,
        extra: toml::Table::new(),
    }
}

fn body_json(builder: reqwest::RequestBuilder) -> serde_json::Value {
    let request = builder.build().expect("request builds");
    let bytes = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body");
    serde_json::from_slice(bytes).expect("body parses")
}

#[test]
fn url_appends_chat_completions_and_trims_slash() {
    let client = quill_model::Client::new();
    let record = record("https://api.openai.com/v1/", "sk-x");
    let request = openai::build(&client, &record, &Prompt::user("hi"))
        .build()
        .expect("request builds");
    assert_eq!(
        request.url().as_str(),
        "https://api.openai.com/v1/chat/completions"
    );
}

#[test]
fn bearer_header_present_when_key_set() {
    let client = quill_model::Client::new();
    let record = record("https://api.openai.com/v1", "sk-x");
    let request = openai::build(&client, &record, &Prompt::user("hi"))
        .build()
        .expect("request builds");
    let auth = request.headers().get("authorization").expect("auth header");
    assert_eq!(auth.to_str().unwrap(), "Bearer sk-x");
}

#[test]
fn bearer_header_omitted_when_key_empty() {
    let client = quill_model::Client::new();
    let record = record("http://localhost:11434/v1", "");
    let request = openai::build(&client, &record, &Prompt::user("hi"))
        .build()
        .expect("request builds");
    assert!(request.headers().get("authorization").is_none());
}

#[test]
fn body_orders_system_before_user() {
    let client = quill_model::Client::new();
    let record = record("https://api.openai.com/v1", "sk-x");
    let prompt = Prompt::user("hi").with_system("be terse");
    let body = body_json(openai::build(&client, &record, &prompt));
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "be terse");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "hi");
}

#[test]
fn body_omits_system_when_absent() {
    let client = quill_model::Client::new();
    let record = record("https://api.openai.com/v1", "sk-x");
    let body = body_json(openai::build(&client, &record, &Prompt::user("hi")));
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

const HAPPY_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"O\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"K\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n\
data: [DONE]\n\n";

#[test]
fn parser_yields_deltas_then_single_stop() {
    let mut parser = openai::Parser::new();
    let frames = parser.feed(HAPPY_BODY.as_bytes()).expect("parses");
    assert_eq!(
        frames,
        vec![
            Frame::Delta("O".into()),
            Frame::Delta("K".into()),
            Frame::Stop,
        ]
    );
    assert_eq!(parser.finish().expect("clean finish"), None);
}

#[test]
fn parser_is_split_invariant() {
    let mut whole = openai::Parser::new();
    let expected = whole.feed(HAPPY_BODY.as_bytes()).expect("parses");

    let mut split = openai::Parser::new();
    let mut frames = Vec::new();
    for byte in HAPPY_BODY.as_bytes() {
        frames.extend(split.feed(&[*byte]).expect("parses"));
    }
    assert_eq!(frames, expected);
}

#[test]
fn empty_content_produces_no_delta() {
    let mut parser = openai::Parser::new();
    let frames = parser
        .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n")
        .expect("parses");
    assert!(frames.is_empty());
}

#[test]
fn done_sentinel_alone_is_one_stop() {
    let mut parser = openai::Parser::new();
    let frames = parser.feed(b"data: [DONE]\n\n").expect("parses");
    assert_eq!(frames, vec![Frame::Stop]);
    assert!(parser.feed(b"data: [DONE]\n\n").expect("parses").is_empty());
}

#[test]
fn malformed_payload_is_protocol_error() {
    let mut parser = openai::Parser::new();
    let err = parser.feed(b"data: {not json}\n\n").unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}

#[test]
fn partial_trailing_data_is_unexpected_end() {
    let mut parser = openai::Parser::new();
    parser.feed(b"data: {\"choices\"").expect("buffers");
    let err = parser.finish().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEnd));
}

#[test]
fn clean_close_counts_as_completion() {
    let mut parser = openai::Parser::new();
    parser
        .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n")
        .expect("parses");
    assert_eq!(parser.finish().expect("clean finish"), Some(Frame::Stop));
}

#[test]
fn trailing_bytes_after_terminal_are_discarded() {
    let mut parser = openai::Parser::new();
    parser.feed(b"data: [DONE]\n\ndata: {\"partial").expect("parses");
    assert_eq!(parser.finish().expect("clean finish"), None);
}

#[test]
fn frames_before_a_malformed_block_survive() {
    // A bad block after a good one must not swallow the good one's
    // delta; the error is delivered on the next call instead.
    let mut parser = openai::Parser::new();
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\ndata: {not json}\n\n";
    let frames = parser.feed(body.as_bytes()).expect("delta kept");
    assert_eq!(frames, vec![Frame::Delta("hi".into())]);
    let err = parser.feed(b"").unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}

#[test]
fn held_error_surfaces_at_body_close() {
    let mut parser = openai::Parser::new();
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\ndata: {not json}\n\n";
    let frames = parser.feed(body.as_bytes()).expect("delta kept");
    assert_eq!(frames.len(), 1);
    let err = parser.finish().unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}
