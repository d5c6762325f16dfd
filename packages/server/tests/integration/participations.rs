use serde_json::json;

use crate::common::{TestApp, routes};

fn individual() -> serde_json::Value {
    json!({"participant_type": "individual"})
}

mod entering {
    use super::*;

    #[tokio::test]
    async fn user_can_enter_an_individual_event() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_individual_event(&org.token, 10).await;

        let res = app
            .post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["event_id"], event);
        assert_eq!(res.body["participant_type"], "individual");
        assert_eq!(res.body["captain_id"], alice.id.as_str());
        assert!(res.body["team_name"].is_null());
    }

    #[tokio::test]
    async fn user_cannot_enter_twice() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_individual_event(&org.token, 10).await;
        app.post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await;

        let res = app
            .post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn full_individual_event_rejects_newcomers() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_individual_event(&org.token, 1).await;
        let first = app
            .post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await;
        assert_eq!(first.status, 201);

        let res = app
            .post_with_token(&routes::participate(event), &individual(), &bob.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["message"], "Event is full (1 participants)");
    }

    #[tokio::test]
    async fn participant_type_must_match_the_event() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let solo = app.create_individual_event(&org.token, 10).await;
        let teams = app.create_team_event(&org.token, 10, 5).await;

        let res = app
            .post_with_token(&routes::participate(teams), &individual(), &alice.token)
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .post_with_token(
                &routes::participate(solo),
                &json!({"participant_type": "team", "team_name": "Solo Stars"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn team_requires_a_name() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_team_event(&org.token, 10, 5).await;

        for body in [
            json!({"participant_type": "team"}),
            json!({"participant_type": "team", "team_name": "   "}),
            json!({"participant_type": "team", "team_name": "x".repeat(101)}),
        ] {
            let res = app
                .post_with_token(&routes::participate(event), &body, &alice.token)
                .await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn team_count_is_capped() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 4, 1).await;
        app.create_team(event, "First", &alice.token).await;

        let res = app
            .post_with_token(
                &routes::participate(event),
                &json!({"participant_type": "team", "team_name": "Second"}),
                &bob.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn judge_cannot_enter_the_event_they_judge() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let judge = app.create_user("judge").await;
        let event = app.create_individual_event(&org.token, 10).await;
        let res = app
            .post_with_token(&routes::judges(event), &json!({"user_id": judge.id}), &org.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .post_with_token(&routes::participate(event), &individual(), &judge.token)
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn listing_shows_members_with_captain_flag() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;

        let res = app
            .get_without_token(&routes::event_participations(event))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["team_name"], "Rockets");
        let members = list[0]["members"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0]["user_id"], alice.id.as_str());
        assert_eq!(members[0]["is_captain"], true);
        assert_eq!(members[1]["user_id"], bob.id.as_str());
        assert_eq!(members[1]["is_captain"], false);
    }
}

mod teams {
    use super::*;

    #[tokio::test]
    async fn team_fills_up_to_max_members() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let event = app.create_team_event(&org.token, 2, 1).await;
        let team = app.create_team(event, "Pair", &alice.token).await;
        app.join_team(team, &bob.token).await;

        let res = app
            .post_with_token(&routes::join(team), &json!({}), &carol.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["message"], "Team is full (2 members)");
    }

    #[tokio::test]
    async fn member_of_one_team_cannot_join_another() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        app.create_team(event, "A", &alice.token).await;
        let b = app.create_team(event, "B", &bob.token).await;

        let res = app
            .post_with_token(&routes::join(b), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn individual_participation_cannot_be_joined() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_individual_event(&org.token, 10).await;
        let entry = app
            .post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await
            .id();

        let res = app
            .post_with_token(&routes::join(entry), &json!({}), &bob.token)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn member_can_leave() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &bob.id), &bob.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let team_res = app.get_without_token(&routes::participation(team)).await;
        assert_eq!(team_res.body["members"].as_array().unwrap().len(), 1);
        assert_eq!(team_res.body["captain_id"], alice.id.as_str());
    }

    #[tokio::test]
    async fn captain_leaving_hands_over_to_the_longest_standing_member() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;
        app.join_team(team, &carol.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &alice.id), &alice.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let team_res = app.get_without_token(&routes::participation(team)).await;
        assert_eq!(team_res.body["captain_id"], bob.id.as_str());
        assert_eq!(team_res.body["members"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn last_member_leaving_dissolves_the_team() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &alice.id), &alice.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert_eq!(
            app.get_without_token(&routes::participation(team)).await.status,
            404
        );
        // The freed user may start over.
        app.create_team(event, "Rockets II", &alice.token).await;
    }

    #[tokio::test]
    async fn only_the_captain_can_remove_others() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;
        app.join_team(team, &carol.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &carol.id), &bob.token)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .delete_with_token(&routes::member(team, &carol.id), &alice.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);
    }

    #[tokio::test]
    async fn member_cannot_remove_an_outsider() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let outsider = app.create_user("outsider").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &outsider.id), &bob.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn removing_a_non_member_is_not_found() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;

        let res = app
            .delete_with_token(&routes::member(team, &bob.id), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod captaincy {
    use super::*;

    async fn team_of_two(app: &TestApp) -> (i32, crate::common::TestUser, crate::common::TestUser) {
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;
        (team, alice, bob)
    }

    #[tokio::test]
    async fn captain_can_transfer_captaincy() {
        let app = TestApp::spawn().await;
        let (team, alice, bob) = team_of_two(&app).await;

        let res = app
            .patch_with_token(&routes::transfer_captaincy(team, &bob.id), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let team_res = app.get_without_token(&routes::participation(team)).await;
        assert_eq!(team_res.body["captain_id"], bob.id.as_str());

        // Alice is an ordinary member now.
        let res = app
            .patch_with_token(&routes::transfer_captaincy(team, &alice.id), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn non_captain_cannot_transfer() {
        let app = TestApp::spawn().await;
        let (team, _alice, bob) = team_of_two(&app).await;

        let res = app
            .patch_with_token(&routes::transfer_captaincy(team, &bob.id), &json!({}), &bob.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn transfer_to_self_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let (team, alice, _bob) = team_of_two(&app).await;

        let res = app
            .patch_with_token(&routes::transfer_captaincy(team, &alice.id), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "User is already the captain");
    }

    #[tokio::test]
    async fn transfer_to_outsider_is_not_found() {
        let app = TestApp::spawn().await;
        let (team, alice, _bob) = team_of_two(&app).await;
        let carol = app.create_user("carol").await;

        let res = app
            .patch_with_token(&routes::transfer_captaincy(team, &carol.id), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn only_the_captain_can_delete_the_participation() {
        let app = TestApp::spawn().await;
        let (team, alice, bob) = team_of_two(&app).await;

        let res = app.delete_with_token(&routes::participation(team), &bob.token).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::participation(team), &alice.token).await;
        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(
            app.get_without_token(&routes::participation(team)).await.status,
            404
        );
    }
}

mod team_avatar {
    use super::*;

    #[tokio::test]
    async fn captain_can_set_the_team_avatar() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let event = app.create_team_event(&org.token, 10, 5).await;
        let team = app.create_team(event, "Rockets", &alice.token).await;
        app.join_team(team, &bob.token).await;

        let denied = app
            .upload_with_token(&routes::team_avatar(team), "logo.png", "image/png", b"logo".to_vec(), &[], &bob.token)
            .await;
        assert_eq!(denied.status, 403);

        let res = app
            .upload_with_token(&routes::team_avatar(team), "logo.png", "image/png", b"logo".to_vec(), &[], &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["avatar_url"].as_str().unwrap();
        assert_eq!(app.get_without_token(url).await.text, "logo");
    }

    #[tokio::test]
    async fn individual_entries_have_no_avatar() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_individual_event(&org.token, 10).await;
        let entry = app
            .post_with_token(&routes::participate(event), &individual(), &alice.token)
            .await
            .id();

        let res = app
            .upload_with_token(&routes::team_avatar(entry), "me.png", "image/png", b"x".to_vec(), &[], &alice.token)
            .await;

        assert_eq!(res.status, 400);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn simultaneous_entries_by_one_user_yield_one_participation() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let event = app.create_individual_event(&org.token, 10).await;
        let path = routes::participate(event);
        let body = individual();

        let (a, b, c, d) = tokio::join!(
            app.post_with_token(&path, &body, &alice.token),
            app.post_with_token(&path, &body, &alice.token),
            app.post_with_token(&path, &body, &alice.token),
            app.post_with_token(&path, &body, &alice.token),
        );
        let mut statuses: Vec<u16> = [&a, &b, &c, &d].iter().map(|r| r.status).collect();
        statuses.sort_unstable();

        assert_eq!(statuses, vec![201, 409, 409, 409], "{} {} {} {}", a.text, b.text, c.text, d.text);
        let listed = app
            .get_without_token(&routes::event_participations(event))
            .await;
        assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn simultaneous_joins_stop_at_capacity() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org").await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let carol = app.create_user("carol").await;
        let dave = app.create_user("dave").await;
        let erin = app.create_user("erin").await;
        let event = app.create_team_event(&org.token, 3, 1).await;
        let team = app.create_team(event, "Trio", &alice.token).await;
        let path = routes::join(team);
        let body = json!({});

        let (b, c, d, e) = tokio::join!(
            app.post_with_token(&path, &body, &bob.token),
            app.post_with_token(&path, &body, &carol.token),
            app.post_with_token(&path, &body, &dave.token),
            app.post_with_token(&path, &body, &erin.token),
        );
        let mut statuses: Vec<u16> = [&b, &c, &d, &e].iter().map(|r| r.status).collect();
        statuses.sort_unstable();

        assert_eq!(statuses, vec![204, 204, 409, 409], "{} {} {} {}", b.text, c.text, d.text, e.text);
        let team = app.get_without_token(&routes::participation(team)).await;
        assert_eq!(team.body["members"].as_array().map(Vec::len), Some(3));
    }
}
