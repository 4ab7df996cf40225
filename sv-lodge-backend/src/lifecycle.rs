//! Charge computation and the derived room board.

use core::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sv_lodge_storage::models::{Booking, Room, RoomStatus};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Started hours between check-in and `now`. A clock behind the check-in
/// time counts as zero.
#[must_use]
pub fn stay_hours(check_in: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - check_in).num_milliseconds();
    if elapsed <= 0 {
        return 0;
    }
    elapsed / MILLIS_PER_HOUR + i64::from(elapsed % MILLIS_PER_HOUR != 0)
}

/// Every stay is billed for at least one hour.
#[must_use]
pub fn billable_hours(stay_hours: i64) -> i64 {
    stay_hours.max(1)
}

#[must_use]
#[allow(clippy::cast_precision_loss, reason = "stays are far below 2^52 hours")]
pub fn expected_charge(billable_hours: i64, hourly_rate: f64) -> f64 {
    billable_hours as f64 * hourly_rate
}

/// Rooms `1..=count`, occupied exactly where an open booking points.
/// Bookings for rooms outside the pool are ignored.
#[must_use]
pub fn room_board(count: u32, bookings: &[Booking]) -> Vec<Room> {
    let mut rooms = Room::pool(count);
    for booking in bookings.iter().filter(|booking| booking.is_open()) {
        let Some(index) = booking.room_number.checked_sub(1) else {
            continue;
        };
        if let Some(room) = rooms.get_mut(index as usize) {
            room.status = RoomStatus::Occupied;
        }
    }
    rooms
}

/// What the desk shows before the payment is committed.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub booking_id: String,
    pub serial_number: u64,
    pub room_number: u32,
    pub guest_name: String,
    pub phone: String,
    pub check_in_time: DateTime<Utc>,
    pub stay_hours: i64,
    pub billable_hours: i64,
    pub expected_amount: f64,
    pub paid_amount: f64,
    pub low_payment: bool,
}

impl CheckoutQuote {
    #[must_use]
    pub fn new(booking: &Booking, now: DateTime<Utc>, hourly_rate: f64, paid_amount: f64) -> Self {
        let stay_hours = stay_hours(booking.check_in_time, now);
        let billable_hours = billable_hours(stay_hours);
        let expected_amount = expected_charge(billable_hours, hourly_rate);
        Self {
            booking_id: booking.id.clone(),
            serial_number: booking.serial_number,
            room_number: booking.room_number,
            guest_name: booking.guest_name.clone(),
            phone: booking.phone.clone(),
            check_in_time: booking.check_in_time,
            stay_hours,
            billable_hours,
            expected_amount,
            paid_amount,
            low_payment: paid_amount < expected_amount,
        }
    }
}

#[must_use]
pub fn render_receipt(lodge_name: &str, booking: &Booking, stay_hours: i64, paid: f64) -> String {
    let mut receipt = String::new();
    // writing into a String cannot fail
    let _ = writeln!(receipt, "{lodge_name}");
    let _ = writeln!(receipt, "Receipt No: #{}", booking.serial_number);
    let _ = writeln!(receipt, "Guest: {}", booking.guest_name);
    let _ = writeln!(receipt, "Phone: {}", booking.phone);
    let _ = writeln!(receipt, "Room: {}", booking.room_number);
    let _ = writeln!(
        receipt,
        "Check-in: {}",
        booking.check_in_time.format("%d/%m/%Y %H:%M")
    );
    if let Some(check_out) = booking.check_out_time {
        let _ = writeln!(receipt, "Check-out: {}", check_out.format("%d/%m/%Y %H:%M"));
    }
    let _ = writeln!(receipt, "Stay: {stay_hours} Hour(s)");
    let _ = writeln!(receipt, "TOTAL PAID: ₹{paid:.2}");
    let _ = writeln!(receipt, "Thank You for your visit!");
    receipt
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use sv_lodge_storage::models::BookingStatus;

    use super::*;

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    fn booking(room_number: u32, status: BookingStatus) -> Booking {
        Booking {
            id: format!("room{room_number}"),
            serial_number: u64::from(room_number),
            room_number,
            guest_name: "Ravi Kumar".to_owned(),
            phone: "9876543210".to_owned(),
            aadhaar: "123412341234".to_owned(),
            address: "Tirupati".to_owned(),
            check_in_time: at("2024-05-01T10:00:00Z"),
            check_out_time: None,
            status,
            paid_amount: 0.0,
            receptionist_name: "Lakshmi".to_owned(),
            receptionist_phone: "9000000001".to_owned(),
        }
    }

    #[test]
    fn stay_rounds_up_started_hours() {
        let check_in = at("2024-05-01T10:00:00Z");
        assert_eq!(stay_hours(check_in, check_in), 0);
        assert_eq!(stay_hours(check_in, check_in + TimeDelta::milliseconds(1)), 1);
        assert_eq!(stay_hours(check_in, check_in + TimeDelta::hours(1)), 1);
        assert_eq!(stay_hours(check_in, check_in + TimeDelta::minutes(90)), 2);
        assert_eq!(stay_hours(check_in, check_in - TimeDelta::hours(3)), 0);
    }

    #[test]
    fn short_stays_bill_one_hour() {
        assert_eq!(billable_hours(0), 1);
        assert_eq!(billable_hours(5), 5);
        assert!((expected_charge(billable_hours(0), 50.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ninety_minutes_at_fifty() {
        let open = booking(3, BookingStatus::Open);
        let now = open.check_in_time + TimeDelta::minutes(90);
        let quote = CheckoutQuote::new(&open, now, 50.0, 80.0);
        assert_eq!(quote.stay_hours, 2);
        assert!((quote.expected_amount - 100.0).abs() < f64::EPSILON);
        assert!(quote.low_payment);
        assert!(!CheckoutQuote::new(&open, now, 50.0, 100.0).low_payment);
    }

    #[test]
    fn board_marks_open_bookings_only() {
        let bookings = [
            booking(2, BookingStatus::Open),
            booking(3, BookingStatus::Closed),
            booking(0, BookingStatus::Open),
            booking(99, BookingStatus::Open),
        ];
        let rooms = room_board(5, &bookings);
        assert_eq!(rooms.len(), 5);
        let occupied: Vec<_> = rooms
            .iter()
            .filter(|room| room.is_occupied())
            .map(|room| room.number)
            .collect();
        assert_eq!(occupied, [2]);
    }

    #[test]
    fn receipt_lists_the_stay() {
        let receipt = render_receipt("Lodge", &booking(4, BookingStatus::Open), 2, 100.0);
        assert!(receipt.starts_with("Lodge\n"));
        assert!(receipt.contains("Receipt No: #4\n"));
        assert!(receipt.contains("Stay: 2 Hour(s)\n"));
        assert!(receipt.contains("TOTAL PAID: ₹100.00\n"));
        assert!(receipt.ends_with("Thank You for your visit!\n"));
    }
}
