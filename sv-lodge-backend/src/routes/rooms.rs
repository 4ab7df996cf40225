use http::{StatusCode, Uri};
use http_body::Body;
use serde::Deserialize;

use crate::forms::{AmountInput, CheckInForm, ConfirmForm, QuoteForm};
use crate::front_desk::FrontDesk;
use crate::routes::{json_response, read_json, read_query, text_response, Reply};

pub async fn check_in<B>(desk: &FrontDesk, room_number: u32, body: B) -> Reply
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let session = desk.require_session()?;
    let form: CheckInForm = read_json(body).await?;
    let guest = form.validate()?;
    let booking = desk
        .create_booking(room_number, guest, session.user())
        .await?;
    json_response(StatusCode::CREATED, &booking)
}

pub async fn quote<B>(desk: &FrontDesk, room_number: u32, body: B) -> Reply
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    desk.require_session()?;
    let form: QuoteForm = read_json(body).await?;
    let paid_amount = form.paid_amount.validate()?;
    json_response(StatusCode::OK, &desk.checkout_quote(room_number, paid_amount)?)
}

pub async fn confirm<B>(desk: &FrontDesk, room_number: u32, body: B) -> Reply
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    desk.require_session()?;
    let form: ConfirmForm = read_json(body).await?;
    let paid_amount = form.paid_amount.validate()?;
    let checkout = desk
        .checkout(room_number, paid_amount, form.acknowledge_low_payment)
        .await?;
    json_response(StatusCode::OK, &checkout)
}

#[derive(Deserialize)]
struct ReceiptQuery {
    paid: Option<String>,
}

pub fn receipt(desk: &FrontDesk, room_number: u32, uri: &Uri) -> Reply {
    desk.require_session()?;
    let query: ReceiptQuery = read_query(uri)?;
    let paid = query
        .paid
        .map(|paid| AmountInput::Text(paid).validate())
        .transpose()?;
    Ok(text_response(desk.receipt(room_number, paid)?))
}
