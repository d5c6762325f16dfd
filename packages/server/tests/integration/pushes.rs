use serde_json::json;

use crate::common::{TestApp, routes};

mod devices {
    use super::*;

    #[tokio::test]
    async fn registering_the_same_token_updates_metadata() {
        let app = TestApp::spawn().await;
        let first = app.register_device("token-a").await;

        let res = app
            .post_without_token(
                routes::PUSH_REGISTER,
                &json!({"token": "token-a", "name": "Renamed iPhone", "system_version": "18.1"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.id(), first);
        assert_eq!(res.body["name"], "Renamed iPhone");
        assert_eq!(res.body["system_version"], "18.1");
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::PUSH_REGISTER, &json!({"token": "  "}))
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn staff_can_list_and_clear_devices() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        app.register_device("token-a").await;
        app.register_device("token-b").await;

        let list = app.get_with_token(routes::PUSH_DEVICES, &org.token).await;
        assert_eq!(list.status, 200, "{}", list.text);
        assert_eq!(list.body.as_array().unwrap().len(), 2);

        let cleared = app.delete_with_token(routes::PUSH_DEVICES, &org.token).await;
        assert_eq!(cleared.status, 200, "{}", cleared.text);
        assert_eq!(cleared.body["deleted_count"], 2);

        let list = app.get_with_token(routes::PUSH_DEVICES, &org.token).await;
        assert!(list.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regular_user_cannot_list_devices() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app.get_with_token(routes::PUSH_DEVICES, &alice.token).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn device_can_unregister_itself() {
        let app = TestApp::spawn().await;
        app.register_device("token-a").await;

        let res = app.delete_without_token(&routes::push_device("token-a")).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.delete_without_token(&routes::push_device("token-a")).await;
        assert_eq!(res.status, 404);
    }
}

mod sending {
    use super::*;

    #[tokio::test]
    async fn send_reports_a_status_per_recipient() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        app.register_device("token-a").await;

        let res = app
            .post_with_token(
                routes::PUSH_SEND,
                &json!({
                    "recipients": ["token-a", "token-unknown"],
                    "title": "Heads up",
                    "body": "Finals start in 10 minutes",
                    "destination": "events/1",
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["results"]["token-a"], "Success");
        assert_eq!(res.body["results"]["token-unknown"], "TokenNotFoundInDB");

        let sent = app.push.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "token-a");
        assert_eq!(sent[0].1.title, "Heads up");
        assert_eq!(sent[0].1.destination.as_deref(), Some("events/1"));
    }

    #[tokio::test]
    async fn deliveries_are_recorded_in_history() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        app.register_device("token-a").await;
        for title in ["First", "Second"] {
            app.post_with_token(
                routes::PUSH_SEND,
                &json!({"recipients": ["token-a"], "title": title, "body": "b"}),
                &org.token,
            )
            .await;
        }

        let res = app
            .get_with_token(&routes::push_history("token-a"), &org.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let history = res.body.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["title"], "Second");
        assert_eq!(history[0]["apns_status"], "Success");

        let limited = app
            .get_with_token(&format!("{}?limit=1&offset=1", routes::push_history("token-a")), &org.token)
            .await;
        assert_eq!(limited.body.as_array().unwrap().len(), 1);
        assert_eq!(limited.body[0]["title"], "First");

        let entry = history[0]["id"].as_i64().unwrap() as i32;
        let res = app
            .delete_with_token(&routes::push_history_entry(entry), &org.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);
        let res = app
            .delete_with_token(&routes::push_history_entry(entry), &org.token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn invalid_tokens_are_pruned() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        app.register_device("token-good").await;
        app.register_device("token-gone").await;
        app.push.reject("token-gone", "Unregistered");

        let res = app
            .post_with_token(
                routes::PUSH_SEND_TO_ALL,
                &json!({"title": "Hello", "body": "everyone"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["results"]["token-good"], "Success");
        assert_eq!(res.body["results"]["token-gone"], "Unregistered");

        let list = app.get_with_token(routes::PUSH_DEVICES, &org.token).await;
        let tokens: Vec<&str> = list.body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["token"].as_str().unwrap())
            .collect();
        assert_eq!(tokens, vec!["token-good"]);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;

        let res = app
            .post_with_token(
                routes::PUSH_SEND,
                &json!({"recipients": ["token-a"], "title": "", "body": "b"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn regular_user_cannot_send() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::PUSH_SEND_TO_ALL,
                &json!({"title": "Spam", "body": "spam"}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn sending_without_apns_configured_is_unavailable() {
        let app = TestApp::spawn_without_push().await;
        let org = app.create_organizer("org").await;

        let res = app
            .post_with_token(
                routes::PUSH_SEND_TO_ALL,
                &json!({"title": "Hello", "body": "world"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 503);
        assert_eq!(res.body["code"], "PUSH_DISABLED");
    }
}
