mod common;

use common::{FakeGenerator, Reply, plan_json};
use serde_json::json;
use study_planner::{GenerationFailure, GenerationState, PlanRequestClient};

const TWO_CHAPTERS: &str = "Chapter 1: Cells are the basic unit of life.\n\nChapter 2: Tissues are groups of similar cells.";

#[tokio::test]
async fn test_two_chapter_material_over_two_days() {
    let fake = FakeGenerator::replying_with_plan(2);
    let client = PlanRequestClient::new(fake.clone());

    let plan = client.generate(TWO_CHAPTERS, 2).await.unwrap();

    assert_eq!(plan.total_days, 2);
    assert_eq!(plan.schedule.len(), 2);
    assert_eq!(plan.schedule[0].day, 1);
    assert_eq!(plan.schedule[1].day, 2);
    assert!(plan.day(2).is_some());
    for day in &plan.schedule {
        assert!(!day.flashcards.is_empty());
        assert!(day.quiz.iter().all(|q| q.has_valid_answer_index()));
    }

    assert_eq!(fake.request_count(), 1);
    let request = fake.last_request().unwrap();
    assert!(request.prompt.contains("Chapter 1: Cells"));
    assert!(request.prompt.contains("2"));
    assert!(request.disable_thinking);
    assert_eq!(request.schema_name, "study_plan");
    assert_eq!(request.schema["required"], json!(["planName", "totalDays", "schedule"]));
}

#[tokio::test]
async fn test_empty_material_makes_no_request() {
    let fake = FakeGenerator::replying_with_plan(3);
    let client = PlanRequestClient::new(fake.clone());

    assert_eq!(client.generate("", 3).await, Err(GenerationFailure::EmptyInput));
    assert_eq!(client.generate(" \n\t ", 3).await, Err(GenerationFailure::EmptyInput));
    assert_eq!(fake.request_count(), 0);
}

#[tokio::test]
async fn test_unsupported_day_counts_are_rejected() {
    let fake = FakeGenerator::replying_with_plan(3);
    let client = PlanRequestClient::new(fake.clone());

    assert_eq!(
        client.generate(TWO_CHAPTERS, 0).await,
        Err(GenerationFailure::InvalidDayCount(0))
    );
    assert_eq!(
        client.generate(TWO_CHAPTERS, 15).await,
        Err(GenerationFailure::InvalidDayCount(15))
    );
    assert_eq!(fake.request_count(), 0);
}

#[tokio::test]
async fn test_every_supported_day_count() {
    for days in 1..=14 {
        let client = PlanRequestClient::new(FakeGenerator::replying_with_plan(days));
        let plan = client.generate(TWO_CHAPTERS, days).await.unwrap();
        assert_eq!(plan.total_days, days);
        assert_eq!(plan.schedule.len(), days as usize);
    }
}

#[tokio::test]
async fn test_long_material_is_truncated_by_characters() {
    let fake = FakeGenerator::replying_with_plan(3);
    let client = PlanRequestClient::new(fake.clone());

    let material = format!("{}{}", "a".repeat(30_000), "Ω".repeat(10_000));
    client.generate(&material, 3).await.unwrap();

    let prompt = fake.last_request().unwrap().prompt;
    assert!(prompt.contains(&"a".repeat(30_000)));
    assert!(!prompt.contains('Ω'));
}

#[tokio::test]
async fn test_custom_content_limit() {
    let fake = FakeGenerator::replying_with_plan(1);
    let client = PlanRequestClient::with_content_limit(fake.clone(), 5);
    assert_eq!(client.max_content_chars(), 5);

    client.generate("abcdefghij", 1).await.unwrap();
    let prompt = fake.last_request().unwrap().prompt;
    assert!(prompt.contains("abcde"));
    assert!(!prompt.contains("abcdef"));
}

#[tokio::test]
async fn test_malformed_reply_is_schema_violation() {
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text("{not json".to_string())));

    let result = client.generate(TWO_CHAPTERS, 2).await;
    assert!(matches!(result, Err(GenerationFailure::SchemaViolation(_))));

    // Failure carries the visible state to Error
    let mut state = GenerationState::new();
    assert!(state.submit(TWO_CHAPTERS));
    assert!(state.resolve(result));
    assert_eq!(state, GenerationState::Error);
    assert!(state.is_input_enabled());
}

#[tokio::test]
async fn test_reply_missing_required_field() {
    let mut plan = plan_json(2);
    plan.as_object_mut().unwrap().remove("planName");
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(plan.to_string())));

    assert!(matches!(
        client.generate(TWO_CHAPTERS, 2).await,
        Err(GenerationFailure::SchemaViolation(_))
    ));
}

#[tokio::test]
async fn test_fenced_reply_is_accepted() {
    let reply = format!("```json\n{}\n```", plan_json(2));
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(reply)));

    let plan = client.generate(TWO_CHAPTERS, 2).await.unwrap();
    assert_eq!(plan.plan_name, "Biology Basics");
}

#[tokio::test]
async fn test_total_days_mismatch_is_rejected() {
    let client = PlanRequestClient::new(FakeGenerator::replying_with_plan(3));

    assert!(matches!(
        client.generate(TWO_CHAPTERS, 2).await,
        Err(GenerationFailure::SchemaViolation(_))
    ));
}

#[tokio::test]
async fn test_out_of_range_answer_index_is_rejected() {
    let mut plan = plan_json(1);
    plan["schedule"][0]["quiz"][0]["correctAnswerIndex"] = json!(4);
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(plan.to_string())));

    assert!(matches!(
        client.generate(TWO_CHAPTERS, 1).await,
        Err(GenerationFailure::SchemaViolation(_))
    ));
}

#[tokio::test]
async fn test_negative_answer_index_is_rejected() {
    let mut plan = plan_json(1);
    plan["schedule"][0]["quiz"][0]["correctAnswerIndex"] = json!(-1);
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(plan.to_string())));

    assert!(matches!(
        client.generate(TWO_CHAPTERS, 1).await,
        Err(GenerationFailure::SchemaViolation(_))
    ));
}

#[tokio::test]
async fn test_negative_day_number_is_rejected() {
    let mut plan = plan_json(1);
    plan["schedule"][0]["day"] = json!(-1);
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(plan.to_string())));

    assert!(matches!(
        client.generate(TWO_CHAPTERS, 1).await,
        Err(GenerationFailure::SchemaViolation(_))
    ));
}

#[tokio::test]
async fn test_soft_count_deviation_is_accepted() {
    let mut plan = plan_json(1);
    plan["schedule"][0]["flashcards"] = json!([{ "front": "Only", "back": "One" }]);
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text(plan.to_string())));

    let plan = client.generate(TWO_CHAPTERS, 1).await.unwrap();
    assert_eq!(plan.flashcard_count(), 1);
    assert_eq!(plan.quiz_question_count(), 1);
}

#[tokio::test]
async fn test_no_text_is_empty_response() {
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Empty));
    assert_eq!(
        client.generate(TWO_CHAPTERS, 2).await,
        Err(GenerationFailure::EmptyResponse)
    );

    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Text("   ".to_string())));
    assert_eq!(
        client.generate(TWO_CHAPTERS, 2).await,
        Err(GenerationFailure::EmptyResponse)
    );
}

#[tokio::test]
async fn test_transport_error_is_reported() {
    let client = PlanRequestClient::new(FakeGenerator::new(Reply::Fail("connection reset".to_string())));

    match client.generate(TWO_CHAPTERS, 2).await {
        Err(GenerationFailure::TransportFailure(message)) => {
            assert!(message.contains("connection reset"))
        }
        other => panic!("expected TransportFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_each_call_issues_one_request() {
    let fake = FakeGenerator::replying_with_plan(2);
    let client = PlanRequestClient::new(fake.clone());

    client.generate(TWO_CHAPTERS, 2).await.unwrap();
    client.generate(TWO_CHAPTERS, 2).await.unwrap();
    assert_eq!(fake.request_count(), 2);
    assert_eq!(client.provider_name(), "Fake");
    assert_eq!(client.model_name(), "fake-model");
}
