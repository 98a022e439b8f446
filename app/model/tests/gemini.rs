//! Tests for the Gemini request builder and dual-framing frame parser.

use quill_model::{Frame, Prompt, ProviderKind, ProviderRecord, StreamError, gemini};

fn record() -> ProviderRecord {
    ProviderRecord {
        kind: ProviderKind::Gemini,
        base_url: "https://generativelanguage.googleapis.com".to_owned(),
        api_key: "gk".to_owned(),
        model: "gemini-1.5-flash".into(),
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
fn url_names_the_model_and_carries_the_key_in_query() {
    let client = quill_model::Client::new();
    let request = gemini::build(&client, &record(), &Prompt::user("hello"))
        .build()
        .expect("request builds");
    assert!(
        request
            .url()
            .path()
            .ends_with("/models/gemini-1.5-flash:streamGenerateContent")
    );
    let query = request.url().query().expect("query string");
    assert!(query.contains("alt=sse"));
    assert!(query.contains("key=gk"));
    assert!(request.headers().get("authorization").is_none());
}

#[test]
fn body_wraps_the_user_turn_in_contents() {
    let client = quill_model::Client::new();
    let body = body_json(gemini::build(&client, &record(), &Prompt::user("hello")));
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    assert!(body.get("systemInstruction").is_none());
    assert_eq!(body["generationConfig"]["temperature"], 0.3);
}

#[test]
fn system_prompt_becomes_system_instruction() {
    let client = quill_model::Client::new();
    let prompt = Prompt::user("hello").with_system("be brief");
    let body = body_json(gemini::build(&client, &record(), &prompt));
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
}

const SSE_BODY: &str = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"he\"}]}}]}\n\n\
data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"llo\"}]}}]}\n\n";

#[test]
fn sse_mode_yields_deltas_and_close_completes() {
    let mut parser = gemini::Parser::new();
    let frames = parser.feed(SSE_BODY.as_bytes()).expect("parses");
    assert_eq!(
        frames,
        vec![Frame::Delta("he".into()), Frame::Delta("llo".into())]
    );
    assert_eq!(parser.finish().expect("clean finish"), Some(Frame::Stop));
}

#[test]
fn sse_mode_is_split_invariant() {
    let mut whole = gemini::Parser::new();
    let expected = whole.feed(SSE_BODY.as_bytes()).expect("parses");

    let mut split = gemini::Parser::new();
    let mut frames = Vec::new();
    for byte in SSE_BODY.as_bytes() {
        frames.extend(split.feed(&[*byte]).expect("parses"));
    }
    assert_eq!(frames, expected);
}

#[test]
fn finish_reason_is_a_terminal_marker() {
    let mut parser = gemini::Parser::new();
    let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"hi\"}]},\"finishReason\":\"STOP\"}]}\n\n";
    let frames = parser.feed(body.as_bytes()).expect("parses");
    assert_eq!(frames, vec![Frame::Delta("hi".into()), Frame::Stop]);
    assert_eq!(parser.finish().expect("clean finish"), None);
}

#[test]
fn json_array_mode_yields_deltas() {
    let mut parser = gemini::Parser::new();
    let body = "[{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"he\"}]}}]},\n\
{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"llo\"}]}}]}]";
    let frames = parser.feed(body.as_bytes()).expect("parses");
    assert_eq!(
        frames,
        vec![Frame::Delta("he".into()), Frame::Delta("llo".into())]
    );
    assert_eq!(parser.finish().expect("clean finish"), Some(Frame::Stop));
}

#[test]
fn json_mode_is_split_invariant() {
    let body = "[{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a{b}\"}]}}]},\
{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"c\\\"d\"}]}}]}]";
    let mut whole = gemini::Parser::new();
    let expected = whole.feed(body.as_bytes()).expect("parses");
    assert_eq!(expected.len(), 2);

    let mut split = gemini::Parser::new();
    let mut frames = Vec::new();
    for byte in body.as_bytes() {
        frames.extend(split.feed(&[*byte]).expect("parses"));
    }
    assert_eq!(frames, expected);
}

#[test]
fn concatenated_objects_without_array_wrapper_parse() {
    let mut parser = gemini::Parser::new();
    let body = "{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"x\"}]}}]}\n\
{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"y\"}]}}]}";
    let frames = parser.feed(body.as_bytes()).expect("parses");
    assert_eq!(frames, vec![Frame::Delta("x".into()), Frame::Delta("y".into())]);
}

#[test]
fn empty_text_produces_no_delta() {
    let mut parser = gemini::Parser::new();
    let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"\"}]}}]}\n\n";
    let frames = parser.feed(body.as_bytes()).expect("parses");
    assert!(frames.is_empty());
}

#[test]
fn partial_json_object_at_close_is_unexpected_end() {
    let mut parser = gemini::Parser::new();
    parser.feed(b"[{\"candidates\":[{\"conte").expect("buffers");
    let err = parser.finish().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEnd));
}

#[test]
fn stray_bytes_between_objects_are_a_protocol_error() {
    let mut parser = gemini::Parser::new();
    parser
        .feed(b"{\"candidates\":[]}")
        .expect("first object parses");
    let err = parser.feed(b" garbage ").unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}

#[test]
fn deltas_before_a_malformed_frame_survive() {
    // A bad frame after a good one must not swallow the good one's
    // delta; the error is delivered at the next call or at close.
    let mut parser = gemini::Parser::new();
    let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"he\"}]}}]}\n\n\
data: {not json}\n\n";
    let frames = parser.feed(body.as_bytes()).expect("delta kept");
    assert_eq!(frames, vec![Frame::Delta("he".into())]);
    let err = parser.finish().unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}

#[test]
fn json_mode_deltas_before_a_stray_byte_survive() {
    let mut parser = gemini::Parser::new();
    let body = "[{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"x\"}]}}]} oops";
    let frames = parser.feed(body.as_bytes()).expect("delta kept");
    assert_eq!(frames, vec![Frame::Delta("x".into())]);
    let err = parser.feed(b"").unwrap_err();
    assert!(matches!(err, StreamError::Protocol(_)));
}
