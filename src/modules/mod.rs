pub mod auth;
pub mod catalog;
pub mod number;
pub mod payment;
pub mod transaction;
pub mod user;
pub mod wallet;

mod router;
pub use router::get_router;
