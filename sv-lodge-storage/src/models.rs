use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomStatus {
    Available,
    Occupied,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub number: u32,
    pub status: RoomStatus,
}

impl Room {
    #[must_use]
    pub const fn available(number: u32) -> Self {
        Self {
            number,
            status: RoomStatus::Available,
        }
    }

    /// Rooms `1..=count`, all available.
    #[must_use]
    pub fn pool(count: u32) -> Vec<Self> {
        (1..=count).map(Self::available).collect()
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.status == RoomStatus::Occupied
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Open,
    Closed,
}

/// A guest's stay. Records fetched from the spreadsheet are parsed leniently
/// because the sheet hands numbers back as strings and blanks as `""`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::serial")]
    pub serial_number: u64,
    #[serde(deserialize_with = "lenient::room")]
    pub room_number: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub guest_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub aadhaar: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: String,
    pub check_in_time: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_time"
    )]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub paid_amount: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub receptionist_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub receptionist_phone: String,
}

impl Booking {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == BookingStatus::Open
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Receptionist,
}

impl UserRole {
    /// The admin ledger is only offered to administrators. This gates the UI,
    /// the role itself is whatever the operator picked at login.
    #[must_use]
    pub const fn can_view_ledger(self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
}

mod lenient {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Unsigned(u64),
        Float(f64),
        Text(String),
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn whole<E: serde::de::Error>(value: Scalar, what: &str) -> Result<u64, E> {
        match value {
            Scalar::Unsigned(value) => Ok(value),
            Scalar::Float(value) if value.is_finite() && value >= 0.0 => Ok(value.trunc() as u64),
            Scalar::Float(value) => Err(E::custom(format!("{value} is not a valid {what}"))),
            Scalar::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(0);
                }
                text.parse::<u64>()
                    .or_else(|_| {
                        text.parse::<f64>()
                            .ok()
                            .filter(|value| value.is_finite() && *value >= 0.0)
                            .map(|value| value.trunc() as u64)
                            .ok_or(())
                    })
                    .map_err(|()| E::custom(format!("{text:?} is not a valid {what}")))
            }
        }
    }

    pub fn serial<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        whole(Scalar::deserialize(deserializer)?, "serial number")
    }

    pub fn room<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = whole::<D::Error>(Scalar::deserialize(deserializer)?, "room number")?;
        u32::try_from(value).map_err(|_| D::Error::custom(format!("room {value} out of range")))
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Scalar>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(Scalar::Unsigned(value)) => Ok(value as f64),
            Some(Scalar::Float(value)) => Ok(value),
            Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(0.0),
            Some(Scalar::Text(text)) => text
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("{text:?} is not an amount"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            None => String::new(),
            Some(Scalar::Unsigned(value)) => value.to_string(),
            Some(Scalar::Float(value)) => value.to_string(),
            Some(Scalar::Text(text)) => text,
        })
    }

    pub fn optional_time<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|time| Some(time.with_timezone(&Utc)))
                .map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sheet_row() -> serde_json::Value {
        json!({
            "id": "k3j2h1g0f",
            "serialNumber": "17",
            "roomNumber": 4,
            "guestName": "Ravi Kumar",
            "phone": 9_876_543_210_u64,
            "aadhaar": "123412341234",
            "address": "Tirupati",
            "checkInTime": "2024-03-01T08:30:00.000Z",
            "checkOutTime": "",
            "status": "OPEN",
            "paidAmount": "",
            "receptionistName": "Lakshmi",
            "receptionistPhone": "9000000001"
        })
    }

    #[test]
    fn parses_spreadsheet_shaped_row() {
        let booking: Booking = serde_json::from_value(sheet_row()).unwrap();
        assert_eq!(booking.serial_number, 17);
        assert_eq!(booking.room_number, 4);
        assert_eq!(booking.phone, "9876543210");
        assert_eq!(booking.check_out_time, None);
        assert!(booking.paid_amount.abs() < f64::EPSILON);
        assert!(booking.is_open());
    }

    #[test]
    fn missing_paid_amount_is_zero() {
        let mut row = sheet_row();
        row.as_object_mut().unwrap().remove("paidAmount");
        let booking: Booking = serde_json::from_value(row).unwrap();
        assert!(booking.paid_amount.abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_garbage_serial() {
        let mut row = sheet_row();
        row["serialNumber"] = json!("abc");
        assert!(serde_json::from_value::<Booking>(row).is_err());
    }

    #[test]
    fn serializes_camel_case_and_upper_status() {
        let booking: Booking = serde_json::from_value(sheet_row()).unwrap();
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["serialNumber"], json!(17));
        assert_eq!(value["status"], json!("OPEN"));
        assert!(value.get("checkOutTime").is_none());
    }

    #[test]
    fn room_pool_is_numbered_from_one() {
        let rooms = Room::pool(3);
        assert_eq!(
            rooms.iter().map(|room| room.number).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        assert!(rooms.iter().all(|room| !room.is_occupied()));
    }

    #[test]
    fn only_admins_see_the_ledger() {
        assert!(UserRole::Admin.can_view_ledger());
        assert!(!UserRole::Receptionist.can_view_ledger());
        let role: UserRole = serde_json::from_value(json!("RECEPTIONIST")).unwrap();
        assert_eq!(role, UserRole::Receptionist);
    }
}
