use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use rental_shared::{Reservation, User};
use rental_store::{EntityKind, QueryKey};

use crate::{error::AppError, middleware::AuthenticatedSession, state::AppState};

#[derive(Debug, Serialize)]
struct ProfileView {
    user: User,
    reservations: Vec<Reservation>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
) -> Result<Json<ProfileView>, AppError> {
    let user_id = session.user_id()?;

    let user = state
        .cache
        .get_or_fetch(QueryKey::with_id(EntityKind::User, user_id), || state.users.get_user(user_id));
    let reservations = state
        .cache
        .get_or_fetch(QueryKey::with_id(EntityKind::UserReservations, user_id), || {
            state.reservations.list_by_user(user_id)
        });

    let (user, reservations) = tokio::try_join!(user, reservations).map_err(AppError::from_repository)?;

    Ok(Json(ProfileView { user, reservations }))
}
