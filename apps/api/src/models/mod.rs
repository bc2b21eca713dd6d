pub mod appointment;
pub mod dashboard;
pub mod notification;
pub mod product;
pub mod sale;
pub mod service;
pub mod user;
