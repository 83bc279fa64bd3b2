pub mod user;
pub mod property;
pub mod invite;
pub mod booking;
pub mod availability;
pub mod payment;
pub mod notification;

pub use user::*;
pub use property::*;
pub use invite::*;
pub use booking::*;
pub use availability::*;
pub use payment::*;
pub use notification::*;
