use serde_json::json;

use crate::common::{MAX_UPLOAD_SIZE, PASSWORD, TestApp, routes};

const PNG: &[u8] = b"fake-png-bytes";

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_full_profile() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app.get_with_token(routes::ME, &user.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], user.id.as_str());
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["birthday"], "2000-01-01");
        assert_eq!(res.body["gender"], "male");
        assert!(res.body["height_cm"].is_null());
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"full_name": "Alice Cooper", "height_cm": 170, "weight_kg": 60.5}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["full_name"], "Alice Cooper");
        assert_eq!(res.body["height_cm"], 170);
        assert_eq!(res.body["weight_kg"], 60.5);
        assert_eq!(res.body["gender"], "male");
    }

    #[tokio::test]
    async fn explicit_null_clears_optional_measurements() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;
        app.patch_with_token(routes::ME, &json!({"height_cm": 170}), &user.token)
            .await;

        let res = app
            .patch_with_token(routes::ME, &json!({"height_cm": null}), &user.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["height_cm"].is_null());
    }

    #[tokio::test]
    async fn out_of_range_measurements_are_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        for body in [
            json!({"height_cm": 0}),
            json!({"height_cm": 301}),
            json!({"weight_kg": -1.0}),
            json!({"full_name": ""}),
        ] {
            let res = app.patch_with_token(routes::ME, &body, &user.token).await;
            assert_eq!(res.status, 400, "{body} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn public_profile_hides_contact_details() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        let res = app.get_with_token(&routes::user(&alice.id), &bob.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["full_name"], "alice");
        assert!(res.body.get("email").is_none());
        assert!(res.body.get("phone").is_none());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .get_with_token(
                &routes::user("00000000-0000-0000-0000-000000000000"),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod password {
    use super::*;

    #[tokio::test]
    async fn user_can_change_password_and_log_in_with_it() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::ME_PASSWORD,
                &json!({"old_password": PASSWORD, "new_password": "brand-new-pass"}),
                &user.token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert_eq!(app.login(&user.email, PASSWORD).await.status, 401);
        assert_eq!(app.login(&user.email, "brand-new-pass").await.status, 200);
    }

    #[tokio::test]
    async fn wrong_old_password_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::ME_PASSWORD,
                &json!({"old_password": "not-my-password", "new_password": "brand-new-pass"}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.login(&user.email, PASSWORD).await.status, 200);
    }
}

mod avatar {
    use super::*;

    #[tokio::test]
    async fn uploaded_avatar_is_served_and_replaced() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let first = app
            .upload_with_token(routes::ME_AVATAR, "me.png", "image/png", PNG.to_vec(), &[], &user.token)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        let first_url = first.body["avatar_url"].as_str().unwrap().to_string();
        assert!(first_url.starts_with("/files/"), "{first_url}");

        let served = app.get_without_token(&first_url).await;
        assert_eq!(served.status, 200);
        assert_eq!(served.text.as_bytes(), PNG);

        let second = app
            .upload_with_token(routes::ME_AVATAR, "me.jpg", "image/jpeg", b"jpeg".to_vec(), &[], &user.token)
            .await;
        assert_eq!(second.status, 200, "{}", second.text);
        let second_url = second.body["avatar_url"].as_str().unwrap();
        assert_ne!(second_url, first_url);

        assert_eq!(app.get_without_token(&first_url).await.status, 404);
        assert_eq!(app.get_without_token(second_url).await.status, 200);
    }

    #[tokio::test]
    async fn non_image_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;

        let res = app
            .upload_with_token(routes::ME_AVATAR, "notes.txt", "text/plain", b"hi".to_vec(), &[], &user.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;
        let big = vec![0u8; MAX_UPLOAD_SIZE as usize + 1024];

        let res = app
            .upload_with_token(routes::ME_AVATAR, "big.png", "image/png", big, &[], &user.token)
            .await;

        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    }
}
