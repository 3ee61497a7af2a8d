pub mod rating;
pub mod restaurant;
pub mod sale;
pub mod staff;
pub mod user;
