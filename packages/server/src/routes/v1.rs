use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{activity, auth, event, judge, media, participation, push, score, user};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload_limit = config.storage.max_upload_size;
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes(upload_limit))
        .nest("/events", event_routes(upload_limit))
        .nest("/participations", participation_routes(upload_limit))
        .nest("/scores", score_routes())
        .nest("/pushes", push_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
}

fn user_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let profile = OpenApiRouter::new()
        .routes(routes!(user::get_me, user::update_me))
        .routes(routes!(user::change_password))
        .routes(routes!(user::get_user));

    let upload = OpenApiRouter::new()
        .routes(routes!(user::upload_avatar))
        .layer(media::upload_body_limit(upload_limit));

    profile.merge(upload)
}

fn event_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(media::reorder_media))
        .routes(routes!(media::delete_media))
        .routes(routes!(
            activity::list_activities,
            activity::create_activity
        ))
        .routes(routes!(
            activity::update_activity,
            activity::delete_activity
        ))
        .routes(routes!(judge::list_judges, judge::add_judge))
        .routes(routes!(judge::remove_judge))
        .routes(routes!(participation::participate))
        .routes(routes!(participation::list_event_participations))
        .routes(routes!(score::event_scoreboard));

    let upload = OpenApiRouter::new()
        .routes(routes!(media::upload_media))
        .layer(media::upload_body_limit(upload_limit));

    crud.merge(upload)
}

fn participation_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            participation::get_participation,
            participation::delete_participation
        ))
        .routes(routes!(participation::join_team))
        .routes(routes!(participation::remove_member))
        .routes(routes!(participation::transfer_captaincy));

    let upload = OpenApiRouter::new()
        .routes(routes!(participation::upload_team_avatar))
        .layer(media::upload_body_limit(upload_limit));

    crud.merge(upload)
}

fn score_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(score::create_score))
}

fn push_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(push::register_device))
        .routes(routes!(push::list_devices, push::clear_devices))
        .routes(routes!(push::unregister_device))
        .routes(routes!(push::send_push))
        .routes(routes!(push::send_push_to_all))
        .routes(routes!(push::device_history))
        .routes(routes!(push::delete_history_entry))
}
