use http::StatusCode;
use serde::Serialize;
use sv_lodge_storage::models::{Booking, RoomStatus, User};

use crate::front_desk::{FrontDesk, Occupancy};
use crate::routes::{json_response, Reply};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCard {
    pub number: u32,
    pub status: RoomStatus,
    pub booking: Option<Booking>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: User,
    pub can_view_ledger: bool,
    pub hourly_rate: f64,
    pub occupancy: Occupancy,
    pub rooms: Vec<RoomCard>,
}

pub fn dashboard(desk: &FrontDesk) -> Reply {
    let session = desk.require_session()?;
    let mut bookings = desk.list_bookings()?;
    bookings.retain(Booking::is_open);
    let rooms = desk
        .list_rooms()?
        .into_iter()
        .map(|room| RoomCard {
            number: room.number,
            status: room.status,
            booking: bookings
                .iter()
                .find(|booking| booking.room_number == room.number)
                .cloned(),
        })
        .collect();
    let dashboard = Dashboard {
        can_view_ledger: session.can_view_ledger(),
        user: session.into_user(),
        hourly_rate: desk.hourly_rate(),
        occupancy: desk.occupancy()?,
        rooms,
    };
    json_response(StatusCode::OK, &dashboard)
}

pub fn rooms(desk: &FrontDesk) -> Reply {
    desk.require_session()?;
    json_response(StatusCode::OK, &desk.list_rooms()?)
}

pub fn bookings(desk: &FrontDesk) -> Reply {
    desk.require_session()?;
    json_response(StatusCode::OK, &desk.list_bookings()?)
}
