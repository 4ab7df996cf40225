use http::StatusCode;
use serde_json::json;

use crate::front_desk::FrontDesk;
use crate::routes::{json_response, Reply};

pub async fn sync(desk: &FrontDesk) -> Reply {
    desk.require_session()?;
    let synced = desk.pull_from_remote().await;
    json_response(StatusCode::OK, &json!({ "synced": synced }))
}
