use serde::Serialize;
use sqlx::FromRow;

use super::appointment::Appointment;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminSummary {
    pub total_users: i64,
    pub appointments_today: i64,
    pub low_stock_products: i64,
    pub sales_today: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSummary {
    pub appointments_today: Vec<Appointment>,
    pub sales_today: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub upcoming_appointments: Vec<Appointment>,
    pub unread_notifications: i64,
}
