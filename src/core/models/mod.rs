pub mod audit;
pub mod group;
pub mod settlement;
pub mod transaction;
pub mod user;
