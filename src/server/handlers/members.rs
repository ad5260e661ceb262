use axum::extract::Extension;

use crate::auth::Identity;
use crate::entities::Member;
use crate::error::Error;
use crate::server::extract::Json;
use crate::server::DynAPI;

pub async fn register(
    Extension(api): Extension<DynAPI>,
    user: Identity,
) -> Result<Json<Member>, Error> {
    let member = api.register_member(user).await?;

    Ok(member.into())
}

pub async fn me(Extension(api): Extension<DynAPI>, user: Identity) -> Result<Json<Member>, Error> {
    let member = api.find_member(user).await?;

    Ok(member.into())
}
