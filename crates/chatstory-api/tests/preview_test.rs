//! Integration tests for static preview and animated playback.

mod common;

use axum::http::StatusCode;
use chatstory_narrative::domain::playback::PlaybackPhase;

#[tokio::test]
async fn test_static_choice_filters_preview_round_trip() {
    let state = common::instant_state();
    let app = || common::build_test_app(state.clone());
    let story_id = common::create_sample_story(&state).await;
    let base = format!("/api/v1/stories/{story_id}");

    // GET /path: no decisions yet, so the whole script is shown.
    let (status, json) = common::get_json(app(), &format!("{base}/path")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filtered"], false);

    // POST /choices outside playback records the decision only.
    let (status, json) = common::send_json(
        app(),
        "POST",
        &format!("{base}/choices"),
        Some(&serde_json::json!({ "message_id": "m3", "option": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recorded"], true);
    assert_eq!(json["resumed"], false);

    // GET /path follows option b.
    let (_, json) = common::get_json(app(), &format!("{base}/path")).await;
    assert_eq!(json["filtered"], true);
    assert_eq!(json["visited"], serde_json::json!(["m1", "m2", "m3", "m5"]));
    assert_eq!(json["halted_at"], serde_json::Value::Null);
    assert_eq!(json["stop"]["reason"], "end");

    // GET /preview hides the branch not taken.
    let (_, frame) = common::get_json(app(), &format!("{base}/preview")).await;
    assert_eq!(common::frame_ids(&frame), vec!["m1", "m2", "m3", "m5"]);
    assert_eq!(frame["decisions"]["m3"], "b");
}

#[tokio::test]
async fn test_playback_suspends_at_fork_and_resumes_on_choice() {
    let state = common::instant_state();
    let app = || common::build_test_app(state.clone());
    let story_id = common::create_sample_story(&state).await;
    let base = format!("/api/v1/stories/{story_id}");

    // POST /playback/start
    let (status, json) = common::send_json(
        app(),
        "POST",
        &format!("{base}/playback/start"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["run_id"].is_string());

    // The run reveals m1..m3 and waits at the fork.
    common::wait_for_playback(&state, story_id, |s| s.awaiting.is_some()).await;
    let (_, frame) = common::get_json(app(), &format!("{base}/preview")).await;
    assert_eq!(frame["playing"], true);
    assert_eq!(frame["awaiting"], "m3");
    assert_eq!(common::frame_ids(&frame), vec!["m1", "m2", "m3"]);

    // A click on the fork resumes the run.
    let (_, json) = common::send_json(
        app(),
        "POST",
        &format!("{base}/choices"),
        Some(&serde_json::json!({ "message_id": "m3", "option": "a" })),
    )
    .await;
    assert_eq!(json["resumed"], true);

    let snapshot =
        common::wait_for_playback(&state, story_id, |s| s.phase == PlaybackPhase::Finished).await;
    assert_eq!(snapshot.revealed.len(), 5);

    // GET /playback reports the finished run.
    let (_, json) = common::get_json(app(), &format!("{base}/playback")).await;
    assert_eq!(json["phase"]["state"], "finished");

    // Option a leads to m4 and then falls through to m5.
    let (_, frame) = common::get_json(app(), &format!("{base}/preview")).await;
    assert_eq!(frame["playing"], false);
    assert_eq!(common::frame_ids(&frame), vec!["m1", "m2", "m3", "m4", "m5"]);
}

#[tokio::test]
async fn test_start_on_empty_script_returns_null_run() {
    let state = common::instant_state();
    let app = || common::build_test_app(state.clone());
    let (_, json) = common::send_json(
        app(),
        "POST",
        "/api/v1/stories",
        Some(&serde_json::json!({ "title": "blank" })),
    )
    .await;
    let story_id = json["story_id"].as_str().unwrap().to_owned();

    let (status, json) = common::send_json(
        app(),
        "POST",
        &format!("/api/v1/stories/{story_id}/playback/start"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["run_id"], serde_json::Value::Null);
    let (_, json) = common::get_json(
        app(),
        &format!("/api/v1/stories/{story_id}/playback"),
    )
    .await;
    assert_eq!(json["phase"]["state"], "idle");
}
