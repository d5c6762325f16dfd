use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "organizer")]
    Organizer,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Organizers and admins manage events, media, activities and judges.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Organizer | Role::Admin)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Ten random digits, assigned at registration.
    #[sea_orm(unique)]
    pub handle: String,
    #[sea_orm(unique)]
    pub email: String,
    /// E.164, e.g. `+79991234567`.
    #[sea_orm(unique)]
    pub phone: String,
    pub hashed_password: String,

    pub full_name: String,
    pub avatar_url: Option<String>,
    pub birthday: Date,
    pub gender: Gender,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<f64>,
    pub is_verified: bool,
    pub is_2fa_enabled: bool,
    pub role: Role,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
