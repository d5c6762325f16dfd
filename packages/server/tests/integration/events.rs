use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::{TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn organizer_can_create_an_event_with_media_and_activities() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "title": "  Spring Games  ",
                    "description": "Outdoor fun",
                    "date": "2099-04-01",
                    "start_time": "10:00:00",
                    "end_time": "18:00:00",
                    "is_team": true,
                    "max_members": 12,
                    "max_teams": 3,
                    "media": [
                        {"media_type": "image", "url": "https://cdn.example.com/b.png", "order": 5},
                        {"media_type": "image", "url": "https://cdn.example.com/a.png", "order": 1},
                    ],
                    "activities": [
                        {"name": "Tug of war", "is_scoreable": true, "max_score": 10},
                    ],
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Spring Games");
        assert_eq!(res.body["state"], "future");
        assert_eq!(res.body["max_teams"], 3);
        let media = res.body["media"].as_array().unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0]["url"], "https://cdn.example.com/a.png");
        assert_eq!(media[1]["order"], 5);
        assert_eq!(res.body["activities"][0]["name"], "Tug of war");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_events() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({"title": "Nope", "date": "2099-01-01", "max_members": 5}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn capacity_rules_are_enforced() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;

        for (body, message) in [
            (
                json!({"title": "T", "date": "2099-01-01", "is_team": true, "max_members": 10, "max_teams": 3}),
                "max_members must be divisible by max_teams",
            ),
            (
                json!({"title": "T", "date": "2099-01-01", "is_team": true, "max_members": 10}),
                "max_teams required when is_team=True",
            ),
            (
                json!({"title": "T", "date": "2099-01-01", "max_members": 10, "max_teams": 2}),
                "max_teams not allowed when is_team=False",
            ),
            (
                json!({"title": "T", "date": "2099-01-01", "max_members": 0}),
                "max_members must be a positive integer",
            ),
        ] {
            let res = app.post_with_token(routes::EVENTS, &body, &org.token).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["message"], message);
        }
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "title": "Backwards",
                    "date": "2099-01-01",
                    "start_time": "18:00:00",
                    "end_time": "10:00:00",
                    "max_members": 5,
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn list_is_public_and_paginated() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        for _ in 0..3 {
            app.create_individual_event(&org.token, 10).await;
        }

        let res = app
            .get_without_token(&format!("{}?page=2&per_page=2", routes::EVENTS))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        assert_eq!(res.body["pagination"]["page"], 2);
    }

    #[tokio::test]
    async fn search_matches_title_case_insensitively() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        for title in ["Chess Open", "Open Water Swim", "Marathon"] {
            app.create_event(
                &org.token,
                json!({"title": title, "date": "2099-05-05", "max_members": 10}),
            )
            .await;
        }

        let res = app
            .get_without_token(&format!("{}?search=OPEN", routes::EVENTS))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let titles: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Chess Open"));
        assert!(titles.contains(&"Open Water Swim"));
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        app.create_event(
            &org.token,
            json!({"title": "100% fun", "date": "2099-05-05", "max_members": 10}),
        )
        .await;
        app.create_event(
            &org.token,
            json!({"title": "1000 fun", "date": "2099-05-05", "max_members": 10}),
        )
        .await;

        let res = app
            .get_without_token(&format!("{}?search=0%25", routes::EVENTS))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "100% fun");
    }

    #[tokio::test]
    async fn state_filter_splits_past_current_and_future() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let today = Utc::now().date_naive();
        for (title, date) in [
            ("Yesterday", today - Duration::days(1)),
            ("Today", today),
            ("Tomorrow", today + Duration::days(1)),
        ] {
            app.create_event(
                &org.token,
                json!({"title": title, "date": date.to_string(), "max_members": 10}),
            )
            .await;
        }

        for (state, title) in [("past", "Yesterday"), ("current", "Today"), ("future", "Tomorrow")] {
            let res = app
                .get_without_token(&format!("{}?state={state}", routes::EVENTS))
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["pagination"]["total"], 1, "{state}: {}", res.text);
            assert_eq!(res.body["data"][0]["title"], title);
            assert_eq!(res.body["data"][0]["state"], state);
        }
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::event(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod updating {
    use super::*;

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let id = app.create_team_event(&org.token, 10, 5).await;

        let res = app
            .patch_with_token(
                &routes::event(id),
                &json!({"title": "Renamed", "description": "Now with details"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Renamed");
        assert_eq!(res.body["description"], "Now with details");
        assert_eq!(res.body["max_members"], 10);
        assert_eq!(res.body["max_teams"], 5);
    }

    #[tokio::test]
    async fn switching_to_individual_clears_team_limit() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let id = app.create_team_event(&org.token, 10, 5).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"is_team": false}), &org.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_team"], false);
        assert!(res.body["max_teams"].is_null());
    }

    #[tokio::test]
    async fn merged_values_must_stay_consistent() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let id = app.create_team_event(&org.token, 10, 5).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"max_members": 12}), &org.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "max_members must be divisible by max_teams");
    }

    #[tokio::test]
    async fn empty_patch_returns_the_event_unchanged() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let id = app.create_individual_event(&org.token, 10).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({}), &org.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Solo Sprint");
    }

    #[tokio::test]
    async fn regular_user_cannot_update() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let user = app.create_user("alice").await;
        let id = app.create_individual_event(&org.token, 10).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"title": "Mine"}), &user.token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_an_event_removes_its_participations() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let id = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(id, "Rockets", &alice.token).await;

        let res = app.delete_with_token(&routes::event(id), &org.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert_eq!(app.get_without_token(&routes::event(id)).await.status, 404);
        assert_eq!(
            app.get_without_token(&routes::participation(team)).await.status,
            404
        );

        // Alice is free to enter another event's team again.
        let other = app.create_team_event(&org.token, 10, 5).await;
        app.create_team(other, "Rockets", &alice.token).await;
    }

    #[tokio::test]
    async fn deleting_a_missing_event_is_not_found() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;

        let res = app.delete_with_token(&routes::event(42), &org.token).await;

        assert_eq!(res.status, 404);
    }
}
