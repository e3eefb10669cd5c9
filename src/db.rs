pub mod user_repo;
pub use user_repo::UserRepository;
pub mod space_repo;
pub use space_repo::SpaceRepository;
pub mod slot_repo;
pub use slot_repo::SlotRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod manager_repo;
pub use manager_repo::ManagerRepository;
