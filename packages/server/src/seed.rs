use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::*;
use sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use tracing::info;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::entity::user::{self, Gender, Role};
use crate::entity::{
    event, event_activity, event_media, notification_history, participation_member,
};
use crate::utils::hash;

fn render(db: &DatabaseConnection, stmt: &IndexCreateStatement) -> String {
    match db.get_database_backend() {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
        _ => stmt.to_string(SqliteQueryBuilder),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create composite indexes, so we create them
/// on startup. The membership key is load-bearing and must not fail silently.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One membership per user per event.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_participation_member_event_user")
        .table(participation_member::Entity)
        .col(participation_member::Column::EventId)
        .col(participation_member::Column::UserId)
        .to_owned();
    db.execute_unprepared(&render(db, &stmt)).await?;
    info!("Ensured index idx_participation_member_event_user exists");

    let optional = [
        (
            "idx_event_media_event_position",
            Index::create()
                .if_not_exists()
                .name("idx_event_media_event_position")
                .table(event_media::Entity)
                .col(event_media::Column::EventId)
                .col(event_media::Column::Position)
                .to_owned(),
        ),
        (
            "idx_notification_history_device_sent",
            Index::create()
                .if_not_exists()
                .name("idx_notification_history_device_sent")
                .table(notification_history::Entity)
                .col(notification_history::Column::DeviceId)
                .col(notification_history::Column::SentAt)
                .to_owned(),
        ),
    ];

    for (name, stmt) in optional {
        match db.execute_unprepared(&render(db, &stmt)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}

struct SeedUser {
    email: &'static str,
    phone: &'static str,
    full_name: &'static str,
    role: Role,
}

const INITIAL_USERS: &[SeedUser] = &[
    SeedUser {
        email: "admin@sirius.com",
        phone: "+70000000001",
        full_name: "Chief Administrator",
        role: Role::Admin,
    },
    SeedUser {
        email: "organizer@sirius.com",
        phone: "+70000000002",
        full_name: "Chief Organizer",
        role: Role::Organizer,
    },
];

/// Create the initial admin and organizer accounts if they are missing.
pub async fn seed_initial_users(
    db: &DatabaseConnection,
    config: &SeedConfig,
) -> Result<(), DbErr> {
    let Some(password) = config.password.as_deref() else {
        tracing::warn!("seed.password is not set; skipping initial accounts");
        return Ok(());
    };

    let mut created = 0u32;
    for (index, seed) in INITIAL_USERS.iter().enumerate() {
        let exists = user::Entity::find()
            .filter(user::Column::Email.eq(seed.email))
            .count(db)
            .await?
            > 0;
        if exists {
            continue;
        }

        let hashed = hash::hash_password(password)
            .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            handle: Set(format!("{:010}", index + 1)),
            email: Set(seed.email.to_string()),
            phone: Set(seed.phone.to_string()),
            hashed_password: Set(hashed),
            full_name: Set(seed.full_name.to_string()),
            avatar_url: Set(None),
            birthday: Set(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()),
            gender: Set(Gender::Male),
            height_cm: Set(None),
            weight_kg: Set(None),
            is_verified: Set(true),
            is_2fa_enabled: Set(false),
            role: Set(seed.role),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        user::Entity::insert(model)
            .on_conflict(
                sea_query::OnConflict::column(user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {} initial accounts", created);
    }
    Ok(())
}

fn at(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn scheduled(
    event_id: i32,
    name: &str,
    icon: &str,
    start: Option<DateTime<Utc>>,
    hours: i64,
) -> event_activity::ActiveModel {
    event_activity::ActiveModel {
        event_id: Set(event_id),
        name: Set(name.to_string()),
        icon: Set(Some(icon.to_string())),
        is_scoreable: Set(false),
        max_score: Set(None),
        start_dt: Set(start),
        end_dt: Set(start.map(|s| s + Duration::hours(hours))),
        is_versus: Set(false),
        ..Default::default()
    }
}

fn scoreable(
    event_id: i32,
    name: &str,
    icon: &str,
    max_score: i32,
    is_versus: bool,
) -> event_activity::ActiveModel {
    event_activity::ActiveModel {
        event_id: Set(event_id),
        name: Set(name.to_string()),
        icon: Set(Some(icon.to_string())),
        is_scoreable: Set(true),
        max_score: Set(Some(max_score)),
        start_dt: Set(None),
        end_dt: Set(None),
        is_versus: Set(is_versus),
        ..Default::default()
    }
}

struct SampleEvent {
    title: &'static str,
    description: &'static str,
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    is_team: bool,
    max_members: i32,
    max_teams: Option<i32>,
}

impl SampleEvent {
    async fn insert(self, txn: &DatabaseTransaction) -> Result<event::Model, DbErr> {
        let now = Utc::now();
        event::ActiveModel {
            title: Set(self.title.to_string()),
            description: Set(Some(self.description.to_string())),
            date: Set(self.date),
            start_time: Set(self.start_time),
            end_time: Set(self.end_time),
            is_team: Set(self.is_team),
            max_members: Set(self.max_members),
            max_teams: Set(self.max_teams),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await
    }
}

/// Create a past, a current and a future sample event when the table is empty.
pub async fn seed_sample_events(db: &DatabaseConnection) -> Result<(), DbErr> {
    if event::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let txn = db.begin().await?;

    let marathon_day = today + Duration::days(30);
    let marathon = SampleEvent {
        title: "Summer Code Marathon",
        description: "The annual marathon for the best programmers. \
            24 hours of non-stop coding, pizza and energy drinks.",
        date: marathon_day,
        start_time: at(12, 0),
        end_time: None,
        is_team: false,
        max_members: 100,
        max_teams: None,
    }
    .insert(&txn)
    .await?;
    let on_marathon_day = |h, m| at(h, m).map(|t| marathon_day.and_time(t).and_utc());
    for activity in [
        scheduled(marathon.id, "Check-in and merch", "👕", on_marathon_day(12, 0), 1),
        scheduled(marathon.id, "Contest", "💻", on_marathon_day(13, 0), 10),
        scheduled(marathon.id, "Award ceremony", "🏆", on_marathon_day(23, 0), 1),
    ] {
        activity.insert(&txn).await?;
    }

    let robotics = SampleEvent {
        title: "Robotics Championship",
        description: "Build your robot and fight in the arena. \
            The grand prize is an internship at a leading IT company.",
        date: today,
        start_time: at(9, 0),
        end_time: at(18, 0),
        is_team: true,
        max_members: 20,
        max_teams: Some(5),
    }
    .insert(&txn)
    .await?;
    for activity in [
        scoreable(robotics.id, "Robot assembly and tuning", "🛠️", 50, false),
        scoreable(robotics.id, "Qualification runs", "⏱️", 100, true),
        scoreable(robotics.id, "Final robot battle", "🤖", 200, true),
    ] {
        activity.insert(&txn).await?;
    }

    SampleEvent {
        title: "Smart City Hackathon",
        description: "Build a solution that improves the urban environment in 48 hours. \
            The best projects are presented to the city administration.",
        date: today - Duration::days(60),
        start_time: at(18, 0),
        end_time: None,
        is_team: true,
        max_members: 30,
        max_teams: Some(6),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Seeded sample events");
    Ok(())
}
