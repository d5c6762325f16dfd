use serde_json::json;

use crate::common::{TestApp, routes};

fn scheduled() -> serde_json::Value {
    json!({
        "name": "Opening ceremony",
        "icon": "🎉",
        "latitude": 43.4,
        "longitude": 39.95,
        "start_dt": "2099-06-01T10:00:00Z",
        "end_dt": "2099-06-01T11:00:00Z",
    })
}

#[tokio::test]
async fn organizer_can_create_and_list_activities() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let event = app.create_individual_event(&org.token, 10).await;

    let res = app
        .post_with_token(&routes::activities(event), &scheduled(), &org.token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["is_scoreable"], false);
    assert_eq!(res.body["event_id"], event);

    let list = app.get_without_token(&routes::activities(event)).await;
    assert_eq!(list.status, 200);
    assert_eq!(list.body.as_array().unwrap().len(), 1);
    assert_eq!(list.body[0]["name"], "Opening ceremony");
}

#[tokio::test]
async fn activity_rules_are_enforced() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let event = app.create_individual_event(&org.token, 10).await;

    for body in [
        json!({"name": "No schedule"}),
        json!({"name": "Scoreable", "is_scoreable": true}),
        json!({"name": "Scoreable", "is_scoreable": true, "max_score": 0}),
        json!({
            "name": "Backwards",
            "start_dt": "2099-06-01T11:00:00Z",
            "end_dt": "2099-06-01T10:00:00Z",
        }),
        json!({"name": "Lost", "is_scoreable": true, "max_score": 5, "latitude": 91.0}),
    ] {
        let res = app
            .post_with_token(&routes::activities(event), &body, &org.token)
            .await;
        assert_eq!(res.status, 400, "{body} should be rejected");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn update_validates_the_merged_activity() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let event = app.create_individual_event(&org.token, 10).await;
    let id = app
        .post_with_token(&routes::activities(event), &scheduled(), &org.token)
        .await
        .id();

    let renamed = app
        .patch_with_token(
            &routes::activity(event, id),
            &json!({"name": "Grand opening", "icon": null}),
            &org.token,
        )
        .await;
    assert_eq!(renamed.status, 200, "{}", renamed.text);
    assert_eq!(renamed.body["name"], "Grand opening");
    assert!(renamed.body["icon"].is_null());
    assert_eq!(renamed.body["start_dt"], "2099-06-01T10:00:00Z");

    let unscheduled = app
        .patch_with_token(
            &routes::activity(event, id),
            &json!({"start_dt": null}),
            &org.token,
        )
        .await;
    assert_eq!(unscheduled.status, 400);

    let scoreable = app
        .patch_with_token(
            &routes::activity(event, id),
            &json!({"is_scoreable": true, "max_score": 25}),
            &org.token,
        )
        .await;
    assert_eq!(scoreable.status, 200, "{}", scoreable.text);
    assert_eq!(scoreable.body["max_score"], 25);
}

#[tokio::test]
async fn activity_of_another_event_is_not_found() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let first = app.create_individual_event(&org.token, 10).await;
    let second = app.create_individual_event(&org.token, 10).await;
    let id = app
        .post_with_token(&routes::activities(first), &scheduled(), &org.token)
        .await
        .id();

    let res = app
        .patch_with_token(&routes::activity(second, id), &json!({"name": "X"}), &org.token)
        .await;
    assert_eq!(res.status, 404);

    let res = app
        .delete_with_token(&routes::activity(second, id), &org.token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn deleting_an_activity_drops_its_scores() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let alice = app.create_user("alice").await;
    let event = app.create_individual_event(&org.token, 10).await;
    let activity = app
        .post_with_token(
            &routes::activities(event),
            &json!({"name": "Sprint", "is_scoreable": true, "max_score": 10}),
            &org.token,
        )
        .await
        .id();
    let entry = app
        .post_with_token(
            &routes::participate(event),
            &json!({"participant_type": "individual"}),
            &alice.token,
        )
        .await
        .id();
    let scored = app
        .post_with_token(
            routes::SCORES,
            &json!({"participation_id": entry, "activity_id": activity, "score": 7}),
            &org.token,
        )
        .await;
    assert_eq!(scored.status, 201, "{}", scored.text);

    let res = app
        .delete_with_token(&routes::activity(event, activity), &org.token)
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    let board = app.get_without_token(&routes::scoreboard(event)).await;
    assert_eq!(board.body[0]["total"], 0);
    assert_eq!(board.body[0]["score_count"], 0);
}

#[tokio::test]
async fn regular_user_cannot_manage_activities() {
    let app = TestApp::spawn().await;
    let org = app.create_organizer("org").await;
    let user = app.create_user("alice").await;
    let event = app.create_individual_event(&org.token, 10).await;

    let res = app
        .post_with_token(&routes::activities(event), &scheduled(), &user.token)
        .await;

    assert_eq!(res.status, 403);
}
