pub mod campaign;
pub mod customer;
pub mod menu;
pub mod preference;
pub mod profile;
pub mod reservation;
