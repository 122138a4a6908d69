//! Calculate flow test: keypad → judge → Gemini (mocked) → store → session panel.
//!
//! Run with: `cargo test --test calculate_flow_test`

use httpmock::prelude::*;
use snarkulator_core::{
    judge_expression, CalculatorState, GatewayConfig, GeminiBridge, MemStorage, Operator, Session,
    Storage,
};

fn model_reply(ai_result: &str, emotion: &str, mood: &str) -> serde_json::Value {
    let text = serde_json::json!({
        "aiResult": ai_result,
        "response": "Did you really need me for that?",
        "emotion": emotion,
        "mood": mood,
        "activity": "Pretending to be busy",
    })
    .to_string();
    serde_json::json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] })
}

fn bridge_for(server: &MockServer) -> GeminiBridge {
    let config = GatewayConfig {
        gemini_api_key: Some("flow-key".to_string()),
        gemini_base_url: server.base_url(),
        ..GatewayConfig::default()
    };
    GeminiBridge::from_config(&config)
}

#[tokio::test]
async fn keypad_expression_round_trips_through_persona_and_store() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::POST)
                .path("/v1beta/models/gemini-2.5-pro:generateContent")
                .header("x-goog-api-key", "flow-key");
            then.status(200).json_body(model_reply("2000", "judgmental", "Bored"));
        })
        .await;

    let mut calc = CalculatorState::new();
    calc.input_digit('2');
    calc.perform_operation(Operator::Add);
    calc.input_digit('2');
    let expression = calc.expression();
    assert_eq!(expression, "2 + 2");
    assert_eq!(calc.perform_calculation(), Some(4.0));

    let store = MemStorage::new();
    let bridge = bridge_for(&server);
    let reply = judge_expression(&store, &bridge, Some(&expression), 5)
        .await
        .expect("judged");
    mock.assert_async().await;

    assert_eq!(reply.calculation.result, "2000");
    assert_eq!(reply.ai_response.gif, "🤨");
    assert_eq!(reply.ai_response.environment.name, "Garden");

    let recent = store.get_recent_calculations(10).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].expression, "2 + 2");

    let mut session = Session::new();
    session.begin_request();
    session.apply(&reply);
    assert_eq!(session.response_count(), 1);
    assert_eq!(session.current_activity, "Pretending to be busy");
}

#[tokio::test]
async fn unreachable_model_still_stores_fallback() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST);
            then.status(500).body("internal");
        })
        .await;

    let store = MemStorage::new();
    let bridge = bridge_for(&server);
    let reply = judge_expression(&store, &bridge, Some("9 ÷ 3"), 5).await.unwrap();

    assert_eq!(reply.calculation.result, "ERROR");
    assert_eq!(reply.ai_response.stored.emotion, "annoyed");
    assert_eq!(reply.ai_response.gif, "😤");
    assert_eq!(reply.ai_response.environment.name, "Office");
    let stored = store
        .get_ai_responses_by_calculation_id(&reply.calculation.id)
        .await;
    assert_eq!(stored.len(), 1);
}
