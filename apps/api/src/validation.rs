//! Request checks done before anything is written. Stock and sale
//! consistency stays with the database procedures.

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::product::{NewProduct, ProductUpdate};
use crate::models::sale::NewSale;
use crate::models::service::{NewService, ServiceUpdate};

const MAX_NAME_LEN: usize = 120;
const MIN_PASSWORD_CHARS: usize = 6;
const PAYMENT_METHODS: &[&str] = &["cash", "card", "transfer"];

fn check_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation("price must be a non-negative amount".into()));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: i32) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

fn check_duration(minutes: i32) -> Result<(), AppError> {
    if minutes <= 0 {
        return Err(AppError::Validation("duration_minutes must be positive".into()));
    }
    Ok(())
}

pub fn validate_new_service(s: &NewService) -> Result<(), AppError> {
    check_name(&s.name)?;
    check_duration(s.duration_minutes)?;
    check_price(s.price)
}

pub fn validate_service_update(s: &ServiceUpdate) -> Result<(), AppError> {
    if let Some(name) = &s.name {
        check_name(name)?;
    }
    if let Some(minutes) = s.duration_minutes {
        check_duration(minutes)?;
    }
    if let Some(price) = s.price {
        check_price(price)?;
    }
    Ok(())
}

pub fn validate_new_product(p: &NewProduct) -> Result<(), AppError> {
    check_name(&p.name)?;
    check_price(p.price)?;
    check_non_negative("stock_quantity", p.stock_quantity)?;
    check_non_negative("min_stock_level", p.min_stock_level)
}

pub fn validate_product_update(p: &ProductUpdate) -> Result<(), AppError> {
    if let Some(name) = &p.name {
        check_name(name)?;
    }
    if let Some(price) = p.price {
        check_price(price)?;
    }
    if let Some(qty) = p.stock_quantity {
        check_non_negative("stock_quantity", qty)?;
    }
    if let Some(level) = p.min_stock_level {
        check_non_negative("min_stock_level", level)?;
    }
    Ok(())
}

pub fn validate_sale(sale: &NewSale) -> Result<(), AppError> {
    if sale.items.is_empty() {
        return Err(AppError::Validation("a sale needs at least one item".into()));
    }
    if let Some(line) = sale.items.iter().find(|l| l.quantity <= 0) {
        return Err(AppError::Validation(format!(
            "quantity for product {} must be positive",
            line.product_id
        )));
    }
    let method = sale.payment_method.trim();
    if !PAYMENT_METHODS.contains(&method) {
        return Err(AppError::Validation(format!(
            "payment_method must be one of {}",
            PAYMENT_METHODS.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_booking_time(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if scheduled_at <= now {
        return Err(AppError::Validation(
            "appointments must be booked in the future".into(),
        ));
    }
    Ok(())
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::models::sale::SaleLine;

    fn product(name: &str, price: f64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price,
            stock_quantity: stock,
            min_stock_level: 2,
        }
    }

    fn sale(method: &str, quantities: &[i32]) -> NewSale {
        NewSale {
            client_id: None,
            payment_method: method.to_string(),
            items: quantities
                .iter()
                .map(|&quantity| SaleLine {
                    product_id: Uuid::new_v4(),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_product_passes() {
        assert!(validate_new_product(&product("Argan oil shampoo", 12.5, 10)).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(validate_new_product(&product("   ", 12.5, 10)).is_err());
    }

    #[test]
    fn test_negative_price_and_stock_rejected() {
        assert!(validate_new_product(&product("Wax", -1.0, 10)).is_err());
        assert!(validate_new_product(&product("Wax", f64::NAN, 10)).is_err());
        assert!(validate_new_product(&product("Wax", 3.0, -4)).is_err());
    }

    #[test]
    fn test_service_duration_must_be_positive() {
        let s = NewService {
            name: "Haircut".into(),
            description: None,
            duration_minutes: 0,
            price: 20.0,
        };
        assert!(validate_new_service(&s).is_err());
        let update = ServiceUpdate {
            duration_minutes: Some(45),
            ..Default::default()
        };
        assert!(validate_service_update(&update).is_ok());
    }

    #[test]
    fn test_sale_rules() {
        assert!(validate_sale(&sale("cash", &[1, 2])).is_ok());
        assert!(validate_sale(&sale("cash", &[])).is_err());
        assert!(validate_sale(&sale("card", &[1, 0])).is_err());
        assert!(validate_sale(&sale("bitcoin", &[1])).is_err());
    }

    #[test]
    fn test_booking_must_be_future() {
        let now = Utc::now();
        assert!(validate_booking_time(now + Duration::hours(2), now).is_ok());
        assert!(validate_booking_time(now, now).is_err());
        assert!(validate_booking_time(now - Duration::minutes(5), now).is_err());
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("ana@salon.test", "secret1").is_ok());
        assert!(validate_credentials("ana", "secret1").is_err());
        assert!(validate_credentials("ana@salon.test", "123").is_err());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 5 characters, 7 bytes
        assert!(validate_credentials("ana@salon.test", "ñañaa").is_err());
        assert!(validate_credentials("ana@salon.test", "ñañaña").is_ok());
    }
}
