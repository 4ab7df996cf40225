use serde::{Deserialize, Serialize};
use sv_lodge_storage::models::{Booking, BookingStatus};

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    #[must_use]
    pub fn accepts(self, status: BookingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status == BookingStatus::Open,
            Self::Closed => status == BookingStatus::Closed,
        }
    }
}

/// `?search=...&status=...` of the ledger endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: StatusFilter,
}

impl LedgerQuery {
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.accepts(booking.status) && matches_search(self.search.trim(), booking)
    }
}

fn matches_search(search: &str, booking: &Booking) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    booking.guest_name.to_lowercase().contains(&needle)
        || booking.receptionist_name.to_lowercase().contains(&needle)
        || booking.phone.contains(search)
        || booking.receptionist_phone.contains(search)
        || booking.serial_number.to_string().contains(search)
        || booking.room_number.to_string() == search
}

/// Matching bookings, newest serial first.
#[must_use]
pub fn filter_bookings(bookings: &[Booking], query: &LedgerQuery) -> Vec<Booking> {
    let mut matching: Vec<Booking> = bookings
        .iter()
        .filter(|booking| query.matches(booking))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.serial_number.cmp(&a.serial_number));
    matching
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_collected: f64,
    pub active_count: usize,
    pub closed_count: usize,
    pub total_count: usize,
    pub completion_percent: u32,
}

/// Aggregates over the whole collection, independent of any filter.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "a percentage between 0 and 100"
)]
pub fn summarize(bookings: &[Booking]) -> LedgerSummary {
    let total_collected = bookings.iter().map(|booking| booking.paid_amount).sum();
    let active_count = bookings.iter().filter(|booking| booking.is_open()).count();
    let total_count = bookings.len();
    let closed_count = total_count - active_count;
    let completion_percent = if total_count == 0 {
        0
    } else {
        (closed_count as f64 / total_count as f64 * 100.0).round() as u32
    };
    LedgerSummary {
        total_collected,
        active_count,
        closed_count,
        total_count,
        completion_percent,
    }
}
