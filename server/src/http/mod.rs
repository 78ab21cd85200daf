pub mod error;
pub mod health;
pub mod matches;
pub mod players;
pub mod presign;
pub mod routes;
