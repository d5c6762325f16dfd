use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entity::user;
use crate::error::AppError;

const HANDLE_LEN: usize = 10;
const MAX_ATTEMPTS: usize = 20;

fn random_handle() -> String {
    let mut rng = rand::rng();
    (0..HANDLE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Pick a random ten-digit handle not yet used by any user.
///
/// The unique index on `user.handle` still guards the insert itself.
pub async fn generate_unique_handle<C: ConnectionTrait>(db: &C) -> Result<String, AppError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = random_handle();
        let taken = user::Entity::find()
            .filter(user::Column::Handle.eq(&candidate))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(format!(
        "No free handle after {MAX_ATTEMPTS} attempts"
    )))
}
