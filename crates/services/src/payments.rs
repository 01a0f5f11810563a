use crate::error::ServiceError;
use configuration::PaymentRules;
use core_types::{Booking, BookingStatus, NewPayment, Page, PageRequest, Payment, PaymentMethod, PaymentUpdate};
use database::{DateRange, DbRepository, PaymentStats};
use rust_decimal::Decimal;

pub fn check_amount(amount: Decimal) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::validation("payment amount must be greater than zero"));
    }
    Ok(())
}

/// True when `amount` exceeds the booking price by more than the configured tolerance.
pub fn is_overcharge(amount: Decimal, booking_price: Decimal, rules: &PaymentRules) -> bool {
    let ceiling = booking_price * (Decimal::ONE_HUNDRED + rules.overcharge_tolerance_pct) / Decimal::ONE_HUNDRED;
    amount > ceiling
}

#[derive(Debug, Clone)]
pub struct PaymentService {
    repo: DbRepository,
    rules: PaymentRules,
}

impl PaymentService {
    pub fn new(repo: DbRepository, rules: PaymentRules) -> Self {
        Self { repo, rules }
    }

    /// Registers a payment against an existing, non-cancelled booking.
    pub async fn register(&self, payment: &NewPayment, actor: &str) -> Result<Payment, ServiceError> {
        check_amount(payment.amount)?;
        let booking = self.repo.get_booking(payment.booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(ServiceError::validation(format!(
                "booking {} is cancelled and cannot be paid",
                booking.id
            )));
        }
        self.warn_on_overcharge(payment.amount, &booking);
        Ok(self.repo.register_payment(payment, actor).await?)
    }

    fn warn_on_overcharge(&self, amount: Decimal, booking: &Booking) {
        if is_overcharge(amount, booking.total_price, &self.rules) {
            tracing::warn!(
                booking_id = booking.id,
                %amount,
                booking_price = %booking.total_price,
                tolerance_pct = %self.rules.overcharge_tolerance_pct,
                "Payment exceeds the booking price."
            );
        }
    }

    pub async fn get(&self, id: i32) -> Result<Payment, ServiceError> {
        Ok(self.repo.get_payment(id).await?)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Payment>, ServiceError> {
        Ok(self.repo.list_payments(page).await?)
    }

    pub async fn for_booking(&self, booking_id: i32) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.repo.payments_for_booking(booking_id).await?)
    }

    pub async fn for_client(&self, client_id: i32) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.repo.payments_for_client(client_id).await?)
    }

    pub async fn between(&self, range: DateRange) -> Result<Vec<Payment>, ServiceError> {
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(ServiceError::validation("'from' must not be after 'to'"));
            }
        }
        Ok(self.repo.payments_between(range).await?)
    }

    pub async fn by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.repo.payments_by_method(method).await?)
    }

    pub async fn update(&self, id: i32, update: &PaymentUpdate, actor: &str) -> Result<Payment, ServiceError> {
        check_amount(update.amount)?;
        let current = self.repo.get_payment(id).await?;
        let booking = self.repo.get_booking(current.booking_id).await?;
        self.warn_on_overcharge(update.amount, &booking);
        Ok(self.repo.update_payment(id, update, actor).await?)
    }

    pub async fn delete(&self, id: i32, actor: &str) -> Result<(), ServiceError> {
        Ok(self.repo.delete_payment(id, actor).await?)
    }

    pub async fn stats(&self, range: DateRange) -> Result<PaymentStats, ServiceError> {
        Ok(self.repo.payment_stats(range).await?)
    }

    /// Confirmed bookings with no completed payment.
    pub async fn unpaid_bookings(&self) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.bookings_without_payment().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_must_be_positive() {
        assert!(check_amount(dec!(0)).is_err());
        assert!(check_amount(dec!(-5)).is_err());
        assert!(check_amount(dec!(0.01)).is_ok());
    }

    #[test]
    fn overcharge_uses_tolerance() {
        let rules = PaymentRules { overcharge_tolerance_pct: dec!(10) };
        assert!(!is_overcharge(dec!(100), dec!(100), &rules));
        assert!(!is_overcharge(dec!(110), dec!(100), &rules));
        assert!(is_overcharge(dec!(110.01), dec!(100), &rules));

        let strict = PaymentRules { overcharge_tolerance_pct: Decimal::ZERO };
        assert!(is_overcharge(dec!(100.01), dec!(100), &strict));
    }
}
