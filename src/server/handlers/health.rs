use axum::extract::Extension;
use serde_json::{json, Value};

use crate::error::Error;
use crate::server::extract::Json;
use crate::server::DynAPI;

pub async fn check(Extension(api): Extension<DynAPI>) -> Result<Json<Value>, Error> {
    api.check_health().await?;

    Ok(Json(json!({ "status": "ok" })))
}
