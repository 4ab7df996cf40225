use http::StatusCode;
use http_body::Body;

use crate::error::AppError;
use crate::forms::LoginForm;
use crate::front_desk::FrontDesk;
use crate::routes::{empty_response, json_response, read_json, Reply};

pub fn current(desk: &FrontDesk) -> Reply {
    let user = desk.session_user()?.ok_or(AppError::NotFound)?;
    json_response(StatusCode::OK, &user)
}

pub async fn login<B>(desk: &FrontDesk, body: B) -> Reply
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let form: LoginForm = read_json(body).await?;
    let user = desk.login(form.validate()?)?;
    json_response(StatusCode::CREATED, &user)
}

pub fn logout(desk: &FrontDesk) -> Reply {
    desk.clear_session_user()?;
    Ok(empty_response(StatusCode::NO_CONTENT))
}
