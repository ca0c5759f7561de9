mod booking_repository;
mod profile_repository;
mod slot_repository;

pub use booking_repository::{BookingRepository, InsertBooking};
pub use profile_repository::ProfileRepository;
pub use slot_repository::SlotRepository;
