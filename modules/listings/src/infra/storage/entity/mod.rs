pub mod listing;
pub mod reference_set;
pub mod review;
pub mod user;
