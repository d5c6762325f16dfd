use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_details() {
        let app = TestApp::spawn().await;

        let res = app.register("Alice Smith", "Alice@Example.com").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["full_name"], "Alice Smith");
        assert_eq!(res.body["role"], "user");
        assert_eq!(res.body["is_verified"], false);
        assert_eq!(res.body["handle"].as_str().unwrap().len(), 10);
        assert!(res.body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;

        let first = app.register("Alice", "alice@example.com").await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.register("Another Alice", "ALICE@example.com").await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USER_EXISTS");
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_phone() {
        let app = TestApp::spawn().await;
        let body = |email: &str| {
            json!({
                "full_name": "Bob",
                "email": email,
                "phone": "+79990001122",
                "password": PASSWORD,
                "birthday": "1999-12-31",
                "gender": "male",
            })
        };

        let first = app
            .post_without_token(routes::REGISTER, &body("bob@example.com"))
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .post_without_token(routes::REGISTER, &body("bob2@example.com"))
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USER_EXISTS");
    }

    #[tokio::test]
    async fn rejects_invalid_fields() {
        let app = TestApp::spawn().await;
        let valid = json!({
            "full_name": "Carol",
            "email": "carol@example.com",
            "phone": "+79990001123",
            "password": PASSWORD,
            "birthday": "2001-02-03",
            "gender": "female",
        });

        for (field, value) in [
            ("email", json!("not-an-email")),
            ("phone", json!("89990001123x")),
            ("password", json!("short")),
            ("password", json!("a".repeat(51))),
            ("full_name", json!("   ")),
            ("birthday", json!("2999-01-01")),
        ] {
            let mut body = valid.clone();
            body[field] = value;
            let res = app.post_without_token(routes::REGISTER, &body).await;
            assert_eq!(res.status, 400, "{field} should be rejected: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REGISTER, &json!({"email": "x@example.com"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn registered_user_can_log_in_with_email() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com").await;

        let res = app.login("ALICE@example.com", PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["access_token"].is_string());
        assert_eq!(res.body["token_type"], "bearer");
        assert_eq!(res.body["expires_in"], 30 * 60);
    }

    #[tokio::test]
    async fn registered_user_can_log_in_with_phone() {
        let app = TestApp::spawn().await;
        let reg = app.register("Alice", "alice@example.com").await;
        let phone = reg.body["phone"].as_str().unwrap().to_string();

        let res = app.login(&phone, PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["access_token"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com").await;

        let res = app.login("alice@example.com", "wrongpass").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_error_as_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app.login("ghost@example.com", PASSWORD).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn empty_identifier_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.login("  ", PASSWORD).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn protected_route_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;
        let forged = eventhub::utils::jwt::sign(
            user.id.parse().unwrap(),
            "some-other-secret",
            30,
        )
        .unwrap();

        let res = app.get_with_token(routes::ME, &forged.token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let app = TestApp::spawn().await;
        let user = app.create_user("alice").await;
        let expired = eventhub::utils::jwt::sign(
            user.id.parse().unwrap(),
            "test-secret-for-integration-tests",
            -5,
        )
        .unwrap();

        let res = app.get_with_token(routes::ME, &expired.token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_EXPIRED");
    }
}
