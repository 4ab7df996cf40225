//! The persistence and sync service every route goes through.
//!
//! Local storage is the working copy. Every mutation is committed locally
//! under the write lock first and forwarded to the remote store after the
//! lock is released. Rooms are dual-written with the bookings so that a room
//! is occupied exactly when an open booking points at it.

use std::sync::Arc;

use serde::Serialize;
use sv_lodge_config::Config;
use sv_lodge_remote::RemoteStore;
use sv_lodge_storage::models::{Booking, BookingStatus, Room, RoomStatus, User};
use sv_lodge_storage::{FileStorage, LocalStore, MemoryStorage, Storage};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::AppError;
use crate::forms::{GuestDetails, Operator};
use crate::lifecycle::{render_receipt, room_board, CheckoutQuote};
use crate::session::{generate_id, Session};

#[derive(Clone, Debug, PartialEq)]
pub struct DeskSettings {
    pub rooms: u32,
    pub hourly_rate: f64,
    pub lodge_name: String,
}

impl From<&Config> for DeskSettings {
    fn from(config: &Config) -> Self {
        Self {
            rooms: config.rooms,
            hourly_rate: config.hourly_rate,
            lodge_name: config.lodge_name.clone(),
        }
    }
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub available: usize,
    pub occupied: usize,
    pub total: usize,
}

/// A committed checkout together with its printable receipt.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub booking: Booking,
    pub stay_hours: i64,
    pub expected_amount: f64,
    pub receipt: String,
}

pub struct FrontDesk {
    store: LocalStore,
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    settings: DeskSettings,
    write_lock: Mutex<()>,
}

impl FrontDesk {
    pub fn new(
        store: LocalStore,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        settings: DeskSettings,
    ) -> Self {
        Self {
            store,
            remote,
            clock,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    /// File backed when `storage_dir` is set, in memory otherwise.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let storage: Arc<dyn Storage> = match &config.storage_dir {
            Some(dir) => {
                info!("keeping records in {}", dir.display());
                Arc::new(FileStorage::open(dir.clone())?)
            }
            None => {
                warn!("no storage_dir configured, records are lost on shutdown");
                Arc::new(MemoryStorage::new())
            }
        };
        let remote = sv_lodge_remote::from_config(&config.remote)?;
        Ok(Self::new(
            LocalStore::new(storage, &config.namespace),
            remote,
            Arc::new(SystemClock),
            DeskSettings::from(config),
        ))
    }

    #[must_use]
    pub const fn settings(&self) -> &DeskSettings {
        &self.settings
    }

    #[must_use]
    pub const fn hourly_rate(&self) -> f64 {
        self.settings.hourly_rate
    }

    /// Seeds whatever record is missing. Existing data is never touched.
    pub async fn initialize(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        if !self.store.has_rooms()? {
            info!("creating {} rooms", self.settings.rooms);
            self.store.save_rooms(&Room::pool(self.settings.rooms))?;
        }
        if !self.store.has_serial_counter()? {
            self.store.set_serial_counter(1)?;
        }
        if !self.store.has_bookings()? {
            self.store.save_bookings(&[])?;
        }
        Ok(())
    }

    /// Replaces the local bookings with the remote collection and rebuilds
    /// the room board and the serial counter from it. Any failure leaves the
    /// local records as they were and returns `false`.
    pub async fn pull_from_remote(&self) -> bool {
        if !self.remote.is_configured() {
            info!("remote store not configured, keeping local records");
            return false;
        }
        let bookings = match self.remote.fetch_bookings().await {
            Ok(bookings) => bookings,
            Err(err) => {
                warn!("could not pull bookings from the remote store: {err}");
                return false;
            }
        };
        match self.replace_bookings(&bookings).await {
            Ok(()) => {
                info!("pulled {} bookings from the remote store", bookings.len());
                true
            }
            Err(err) => {
                error!("could not store pulled bookings: {err}");
                false
            }
        }
    }

    async fn replace_bookings(&self, bookings: &[Booking]) -> Result<(), AppError> {
        let rooms = room_board(self.settings.rooms, bookings);
        let last_serial = bookings
            .iter()
            .map(|booking| booking.serial_number)
            .max()
            .unwrap_or(0);
        let next_serial = last_serial
            .checked_add(1)
            .ok_or(AppError::SerialExhausted(last_serial))?;
        let _guard = self.write_lock.lock().await;
        self.store.save_bookings(bookings)?;
        self.store.save_rooms(&rooms)?;
        self.store.set_serial_counter(next_serial)?;
        Ok(())
    }

    /// Fire and forget. Failures are logged and otherwise ignored.
    pub async fn push_to_remote(&self, booking: &Booking) {
        if !self.remote.is_configured() {
            debug!("remote store not configured, not pushing booking {}", booking.id);
            return;
        }
        if let Err(err) = self.remote.push_booking(booking).await {
            error!("could not push booking {} to the remote store: {err}", booking.id);
        }
    }

    pub fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        Ok(self.store.rooms()?)
    }

    pub fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.bookings()?)
    }

    pub async fn next_serial_number(&self) -> Result<u64, AppError> {
        let _guard = self.write_lock.lock().await;
        self.take_serial()
    }

    // caller holds the write lock
    fn take_serial(&self) -> Result<u64, AppError> {
        let serial = self.store.serial_counter()?;
        let next = serial
            .checked_add(1)
            .ok_or(AppError::SerialExhausted(serial))?;
        self.store.set_serial_counter(next)?;
        Ok(serial)
    }

    /// Checks a guest into an available room on behalf of `operator`.
    pub async fn create_booking(
        &self,
        room_number: u32,
        guest: GuestDetails,
        operator: &User,
    ) -> Result<Booking, AppError> {
        let booking = {
            let _guard = self.write_lock.lock().await;
            let mut rooms = self.store.rooms()?;
            let mut bookings = self.store.bookings()?;
            let room = rooms
                .iter_mut()
                .find(|room| room.number == room_number)
                .ok_or(AppError::UnknownRoom(room_number))?;
            if room.is_occupied()
                || bookings
                    .iter()
                    .any(|booking| booking.is_open() && booking.room_number == room_number)
            {
                return Err(AppError::RoomOccupied(room_number));
            }
            let booking = Booking {
                id: generate_id(),
                serial_number: self.take_serial()?,
                room_number,
                guest_name: guest.guest_name,
                phone: guest.phone,
                aadhaar: guest.aadhaar,
                address: guest.address,
                check_in_time: self.clock.now(),
                check_out_time: None,
                status: BookingStatus::Open,
                paid_amount: 0.0,
                receptionist_name: operator.name.clone(),
                receptionist_phone: operator.phone.clone(),
            };
            room.status = RoomStatus::Occupied;
            bookings.push(booking.clone());
            self.store.save_bookings(&bookings)?;
            self.store.save_rooms(&rooms)?;
            booking
        };
        info!(
            "checked in booking #{} into room {} by {}",
            booking.serial_number, booking.room_number, booking.receptionist_name
        );
        self.push_to_remote(&booking).await;
        Ok(booking)
    }

    /// Closes an open booking. Unknown ids and bookings that are already
    /// closed are left alone and yield `None`.
    pub async fn close_booking(
        &self,
        booking_id: &str,
        paid_amount: f64,
    ) -> Result<Option<Booking>, AppError> {
        let closed = {
            let _guard = self.write_lock.lock().await;
            let mut bookings = self.store.bookings()?;
            let Some(booking) = bookings.iter_mut().find(|booking| booking.id == booking_id) else {
                debug!("no booking {booking_id} to close");
                return Ok(None);
            };
            if !booking.is_open() {
                debug!("booking {booking_id} is already closed");
                return Ok(None);
            }
            booking.status = BookingStatus::Closed;
            booking.check_out_time = Some(self.clock.now());
            booking.paid_amount = paid_amount;
            let closed = booking.clone();

            let mut rooms = self.store.rooms()?;
            if let Some(room) = rooms
                .iter_mut()
                .find(|room| room.number == closed.room_number)
            {
                room.status = RoomStatus::Available;
            }
            self.store.save_bookings(&bookings)?;
            self.store.save_rooms(&rooms)?;
            closed
        };
        info!(
            "closed booking #{} for room {} with {:.2} paid",
            closed.serial_number, closed.room_number, closed.paid_amount
        );
        self.push_to_remote(&closed).await;
        Ok(Some(closed))
    }

    pub fn active_booking_for_room(&self, room_number: u32) -> Result<Option<Booking>, AppError> {
        Ok(self
            .store
            .bookings()?
            .into_iter()
            .find(|booking| booking.is_open() && booking.room_number == room_number))
    }

    pub fn occupancy(&self) -> Result<Occupancy, AppError> {
        let rooms = self.store.rooms()?;
        let occupied = rooms.iter().filter(|room| room.is_occupied()).count();
        Ok(Occupancy {
            available: rooms.len() - occupied,
            occupied,
            total: rooms.len(),
        })
    }

    fn open_booking(&self, room_number: u32) -> Result<Booking, AppError> {
        self.active_booking_for_room(room_number)?
            .ok_or(AppError::NoActiveBooking(room_number))
    }

    /// First checkout step. Nothing is written.
    pub fn checkout_quote(
        &self,
        room_number: u32,
        paid_amount: f64,
    ) -> Result<CheckoutQuote, AppError> {
        let booking = self.open_booking(room_number)?;
        Ok(CheckoutQuote::new(
            &booking,
            self.clock.now(),
            self.settings.hourly_rate,
            paid_amount,
        ))
    }

    /// Second checkout step. A payment below the expected charge is only
    /// committed when the operator acknowledged it.
    pub async fn checkout(
        &self,
        room_number: u32,
        paid_amount: f64,
        acknowledge_low_payment: bool,
    ) -> Result<Checkout, AppError> {
        let quote = self.checkout_quote(room_number, paid_amount)?;
        if quote.low_payment && !acknowledge_low_payment {
            return Err(AppError::LowPayment {
                paid: paid_amount,
                expected: quote.expected_amount,
            });
        }
        let booking = self
            .close_booking(&quote.booking_id, paid_amount)
            .await?
            .ok_or(AppError::NoActiveBooking(room_number))?;
        let receipt = render_receipt(
            &self.settings.lodge_name,
            &booking,
            quote.stay_hours,
            booking.paid_amount,
        );
        Ok(Checkout {
            booking,
            stay_hours: quote.stay_hours,
            expected_amount: quote.expected_amount,
            receipt,
        })
    }

    /// Receipt for the open booking of a room. Without an amount the
    /// expected charge is printed.
    pub fn receipt(&self, room_number: u32, paid_amount: Option<f64>) -> Result<String, AppError> {
        let booking = self.open_booking(room_number)?;
        let quote = CheckoutQuote::new(&booking, self.clock.now(), self.settings.hourly_rate, 0.0);
        Ok(render_receipt(
            &self.settings.lodge_name,
            &booking,
            quote.stay_hours,
            paid_amount.unwrap_or(quote.expected_amount),
        ))
    }

    /// Self-asserted login. The operator becomes the session user of this
    /// device.
    pub fn login(&self, operator: Operator) -> Result<User, AppError> {
        let user = User {
            id: generate_id(),
            name: operator.name,
            phone: operator.phone,
            role: operator.role,
        };
        self.store.set_session_user(&user)?;
        info!("{} logged in as {:?}", user.name, user.role);
        Ok(user)
    }

    pub fn session_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.store.session_user()?)
    }

    pub fn set_session_user(&self, user: &User) -> Result<(), AppError> {
        Ok(self.store.set_session_user(user)?)
    }

    pub fn clear_session_user(&self) -> Result<(), AppError> {
        Ok(self.store.clear_session_user()?)
    }

    pub fn require_session(&self) -> Result<Session, AppError> {
        self.session_user()?
            .map(Session::new)
            .ok_or(AppError::NotLoggedIn)
    }
}
