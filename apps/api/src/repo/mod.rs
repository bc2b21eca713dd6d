//! Table queries and stored-procedure calls against the hosted Postgres.
//!
//! Money columns are `numeric` in the database and read back as `float8`.

pub mod appointments;
pub mod dashboard;
pub mod notifications;
pub mod products;
pub mod sales;
pub mod services;
pub mod users;
