//! End-to-end tests for the tool-calling conversation loop.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use warbot::agent::{Conversation, ConversationOptions, RecordingSink};
use warbot::error::WarbotError;
use warbot::tools::{AgentTool, ToolParameters, ToolRegistry};
use warbot::types::{Role, ToolCallFragment};

fn echo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(AgentTool::new(
            "get_risk",
            "Risk lookup",
            ToolParameters::object().string("loc", "Location", false).build(),
            |args| async move { Ok(json!({"risk": "low", "loc": args.get_str_opt("loc")})) },
        )))
        .unwrap();
    registry
}

fn conversation(provider: &Arc<MockProvider>, registry: ToolRegistry) -> Conversation {
    let options = ConversationOptions::builder()
        .system_prompt("You are a test assistant.")
        .build();
    Conversation::new(provider.clone(), registry, options)
}

fn roles(conversation: &Conversation) -> Vec<Role> {
    conversation.history().iter().map(|m| m.role).collect()
}

#[tokio::test]
async fn plain_answer_streams_reasoning_and_text() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_round(vec![reasoning("t"), text("hello "), text("world"), finish("stop")]);

    let mut conv = conversation(&provider, echo_registry());
    let mut sink = RecordingSink::new();
    let answer = conv.send_message("hi", &mut sink).await.unwrap();

    assert_eq!(answer, "hello world");
    assert_eq!(sink.reasoning, "t");
    assert_eq!(sink.answer, "hello world");
    assert!(sink.tool_calls.is_empty());
    assert_eq!(roles(&conv), vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(conv.history()[2].text(), "hello world");
}

#[tokio::test]
async fn fragmented_tool_call_is_dispatched_then_answered() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_round(vec![
            tool_fragment(
                ToolCallFragment::new(Some("1"), Some(0))
                    .name("get_risk")
                    .arguments("{\"loc\""),
            ),
            tool_fragment(ToolCallFragment::new(Some("1"), None).arguments(":\"X\"}")),
            finish("tool_calls"),
        ])
        .queue_answer("Risk is low.");

    let mut conv = conversation(&provider, echo_registry());
    let mut sink = RecordingSink::new();
    let answer = conv.send_message("risk at X?", &mut sink).await.unwrap();

    assert_eq!(answer, "Risk is low.");
    assert_eq!(sink.tool_calls.len(), 1);
    assert_eq!(sink.tool_calls[0].id, "1");
    assert_eq!(sink.tool_calls[0].arguments, "{\"loc\":\"X\"}");

    assert_eq!(
        roles(&conv),
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    let assistant = &conv.history()[2];
    assert_eq!(assistant.tool_calls[0].name, "get_risk");
    let tool_msg = &conv.history()[3];
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("1"));
    assert_eq!(tool_msg.name.as_deref(), Some("get_risk"));
    let content: serde_json::Value = serde_json::from_str(tool_msg.text()).unwrap();
    assert_eq!(content, json!({"risk": "low", "loc": "X"}));

    // Second round sees the tool result and the advertised tools.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 4);
    assert_eq!(requests[1].tools[0].name, "get_risk");
}

#[tokio::test]
async fn unknown_capability_becomes_error_payload() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_tool_call("c1", "foo", json!({}))
        .queue_answer("Sorry.");

    let mut conv = conversation(&provider, echo_registry());
    let mut sink = RecordingSink::new();
    let answer = conv.send_message("use foo", &mut sink).await.unwrap();

    assert_eq!(answer, "Sorry.");
    let tool_msg = &conv.history()[3];
    assert_eq!(tool_msg.role, Role::Tool);
    let content: serde_json::Value = serde_json::from_str(tool_msg.text()).unwrap();
    assert_eq!(content["error"]["kind"], "unknown_capability");
    assert_eq!(sink.tool_results.len(), 1);
    assert!(sink.tool_results[0].2);
}

#[tokio::test]
async fn two_calls_in_one_round_keep_finalization_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    for name in ["alpha", "beta"] {
        let order = order.clone();
        registry
            .register(Arc::new(AgentTool::new(
                name,
                "records call order",
                ToolParameters::empty(),
                move |_args| {
                    let order = order.clone();
                    async move {
                        order.lock().unwrap().push(name);
                        Ok(json!({"tool": name}))
                    }
                },
            )))
            .unwrap();
    }

    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_round(vec![
            tool_fragment(ToolCallFragment::new(Some("b"), Some(0)).name("beta")),
            tool_fragment(ToolCallFragment::new(Some("a"), Some(1)).name("alpha")),
            tool_fragment(ToolCallFragment::new(Some("b"), None).arguments("{}")),
            tool_fragment(ToolCallFragment::new(Some("a"), None).arguments("{}")),
            finish("tool_calls"),
        ])
        .queue_answer("done");

    let mut conv = conversation(&provider, registry);
    conv.send_message("go", &mut RecordingSink::new()).await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["beta", "alpha"]);
    let tool_ids: Vec<_> = conv
        .history()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.tool_call_id.clone().unwrap())
        .collect();
    assert_eq!(tool_ids, vec!["b", "a"]);
}

#[tokio::test]
async fn every_tool_message_follows_a_matching_request() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_tool_call("x1", "get_risk", json!({"loc": "A"}))
        .queue_tool_call("x2", "get_risk", json!({"loc": "B"}))
        .queue_answer("both low");

    let mut conv = conversation(&provider, echo_registry());
    conv.send_message("A and B?", &mut RecordingSink::new()).await.unwrap();

    let history = conv.history();
    for (i, msg) in history.iter().enumerate() {
        if msg.role != Role::Tool {
            continue;
        }
        let id = msg.tool_call_id.as_deref().unwrap();
        let announced = history[..i]
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .unwrap();
        assert!(announced.tool_calls.iter().any(|c| c.id == id));
    }
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test]
async fn stray_fragments_without_tool_calls_finish_are_not_dispatched() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(AgentTool::new(
            "get_risk",
            "counts calls",
            ToolParameters::empty(),
            move |_args| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({}))
                }
            },
        )))
        .unwrap();

    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_round(vec![
        text("plain"),
        tool_fragment(ToolCallFragment::new(Some("s"), Some(0)).name("get_risk").arguments("{}")),
        finish("stop"),
    ]);

    let mut conv = conversation(&provider, registry);
    let answer = conv.send_message("hi", &mut RecordingSink::new()).await.unwrap();

    assert_eq!(answer, "plain");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn degenerate_tool_calls_round_is_an_empty_answer() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_round(vec![
        tool_fragment(ToolCallFragment::new(Some("n"), Some(0)).arguments("{}")),
        finish("tool_calls"),
    ]);

    let mut conv = conversation(&provider, echo_registry());
    let answer = conv.send_message("hi", &mut RecordingSink::new()).await.unwrap();

    assert_eq!(answer, "");
    assert_eq!(roles(&conv), vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn undecodable_arguments_dispatch_with_empty_mapping() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_round(vec![
            tool_fragment(
                ToolCallFragment::new(Some("1"), Some(0))
                    .name("get_risk")
                    .arguments("{not json"),
            ),
            finish("tool_calls"),
        ])
        .queue_answer("ok");

    let mut conv = conversation(&provider, echo_registry());
    conv.send_message("hi", &mut RecordingSink::new()).await.unwrap();

    let content: serde_json::Value = serde_json::from_str(conv.history()[3].text()).unwrap();
    assert_eq!(content, json!({"risk": "low", "loc": null}));
    // The raw argument text is kept on the assistant request.
    assert_eq!(conv.history()[2].tool_calls[0].arguments, "{not json");
}

#[tokio::test]
async fn handler_failure_is_reported_to_the_model() {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(AgentTool::new(
            "flaky",
            "always fails",
            ToolParameters::empty(),
            |_args| async {
                Err(WarbotError::ToolExecution {
                    tool_name: "flaky".into(),
                    message: "backend down".into(),
                })
            },
        )))
        .unwrap();

    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_tool_call("f1", "flaky", json!({}))
        .queue_answer("The lookup failed.");

    let mut conv = conversation(&provider, registry);
    let answer = conv.send_message("try", &mut RecordingSink::new()).await.unwrap();

    assert_eq!(answer, "The lookup failed.");
    let content: serde_json::Value = serde_json::from_str(conv.history()[3].text()).unwrap();
    assert_eq!(content["error"]["kind"], "tool_execution");
    assert!(content["error"]["message"]
        .as_str()
        .unwrap()
        .contains("backend down"));
}

#[tokio::test]
async fn transport_failure_leaves_history_at_last_complete_state() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_tool_call("1", "get_risk", json!({"loc": "X"}))
        .queue_results(vec![
            Ok(text("partial ")),
            Err(WarbotError::Stream("connection reset".into())),
        ]);

    let mut conv = conversation(&provider, echo_registry());
    let err = conv
        .send_message("risk?", &mut RecordingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WarbotError::Stream(_)));
    assert_eq!(
        roles(&conv),
        vec![Role::System, Role::User, Role::Assistant, Role::Tool]
    );
}

#[tokio::test]
async fn stream_without_terminal_reason_is_a_transport_failure() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_round(vec![text("cut off")]);

    let mut conv = conversation(&provider, echo_registry());
    let err = conv
        .send_message("hi", &mut RecordingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WarbotError::Stream(_)));
    assert_eq!(roles(&conv), vec![Role::System, Role::User]);
}

#[tokio::test]
async fn open_failure_propagates() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_open_error(WarbotError::Authentication("bad key".into()));

    let mut conv = conversation(&provider, echo_registry());
    let err = conv
        .send_message("hi", &mut RecordingSink::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WarbotError::Authentication(_)));
}

#[tokio::test]
async fn replayed_history_is_not_mutated_by_a_new_round() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_tool_call("1", "get_risk", json!({"loc": "X"}))
        .queue_answer("low");

    let mut first = conversation(&provider, echo_registry());
    first.send_message("risk?", &mut RecordingSink::new()).await.unwrap();
    let snapshot = first.history().to_vec();

    provider.queue_answer("still low");
    let mut resumed = Conversation::from_history(
        provider.clone(),
        echo_registry(),
        ConversationOptions::default(),
        snapshot.clone(),
    );
    resumed
        .send_message("and now?", &mut RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(&resumed.history()[..snapshot.len()], snapshot.as_slice());
    assert_eq!(resumed.history().len(), snapshot.len() + 2);
}

#[tokio::test]
async fn round_limit_stops_endless_tool_loops() {
    let provider = Arc::new(MockProvider::new("mock"));
    for i in 0..3 {
        provider.queue_tool_call(&format!("c{i}"), "get_risk", json!({}));
    }

    let options = ConversationOptions::builder().max_rounds(2).build();
    let mut conv = Conversation::new(provider.clone(), echo_registry(), options);
    let err = conv
        .send_message("loop", &mut RecordingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WarbotError::RoundLimitExceeded(2)));
    assert_eq!(provider.requests().len(), 2);
    assert_eq!(provider.remaining(), 1);
}

#[tokio::test]
async fn text_around_unfinished_fragments_is_streamed_live() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider
        .queue_round(vec![
            text("Let me check. "),
            tool_fragment(ToolCallFragment::new(Some("1"), Some(0)).name("get_risk")),
            text("(thinking aloud)"),
            tool_fragment(ToolCallFragment::new(Some("1"), None).arguments("{}")),
            finish("tool_calls"),
        ])
        .queue_answer("Low risk.");

    let mut conv = conversation(&provider, echo_registry());
    let mut sink = RecordingSink::new();
    conv.send_message("risk?", &mut sink).await.unwrap();

    assert_eq!(sink.answer, "Let me check. (thinking aloud)Low risk.");
}

#[tokio::test]
async fn answer_after_stray_fragment_reaches_the_sink() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_round(vec![
        tool_fragment(ToolCallFragment::new(Some("s"), Some(0)).name("x")),
        text("final answer"),
        finish("stop"),
    ]);

    let mut conv = conversation(&provider, echo_registry());
    let mut sink = RecordingSink::new();
    let answer = conv.send_message("hi", &mut sink).await.unwrap();

    assert_eq!(answer, "final answer");
    assert_eq!(sink.answer, answer);
    assert!(sink.tool_calls.is_empty());
}

#[tokio::test]
async fn without_system_prompt_history_starts_with_user() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_answer("hi");

    let mut conv = Conversation::new(provider.clone(), ToolRegistry::new(), ConversationOptions::default());
    conv.send_message("hello", &mut RecordingSink::new()).await.unwrap();

    assert_eq!(roles(&conv), vec![Role::User, Role::Assistant]);
    assert!(provider.requests()[0].tools.is_empty());
}
