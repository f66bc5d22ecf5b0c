//! Registered customers and their credit cards.

use bookshop_core::error::{Result, StoreError};
use bookshop_core::utils::CustomerConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// A customer who orders books for delivery
#[derive(Debug, Serialize)]
pub struct Customer {
    id: u32,
    name: String,
    address: String,
    distance: u32,
    #[serde(serialize_with = "serialize_credit")]
    credit: AtomicU32,
}

fn serialize_credit<S: serde::Serializer>(
    credit: &AtomicU32,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u32(credit.load(Ordering::SeqCst))
}

impl Customer {
    /// Register a customer
    pub fn new(
        id: u32,
        name: impl Into<String>,
        address: impl Into<String>,
        distance: u32,
        credit: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            distance,
            credit: AtomicU32::new(credit),
        }
    }

    /// Customer id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivery address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Distance from the store
    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// Credit left on the card
    pub fn available_credit(&self) -> u32 {
        self.credit.load(Ordering::SeqCst)
    }

    /// Deduct `amount` from the card, all or nothing
    pub fn charge(&self, amount: u32) -> Result<()> {
        self.credit
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |credit| {
                credit.checked_sub(amount)
            })
            .map(|_| ())
            .map_err(|available| {
                StoreError::InsufficientFunds {
                    customer: self.id,
                    required: amount,
                    available,
                }
                .into()
            })
    }

    /// Give `amount` back to the card
    pub fn refund(&self, amount: u32) {
        self.credit.fetch_add(amount, Ordering::SeqCst);
    }
}

impl From<&CustomerConfig> for Customer {
    fn from(config: &CustomerConfig) -> Self {
        Self::new(
            config.id,
            config.name.clone(),
            config.address.clone(),
            config.distance,
            config.credit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_core::Error;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_charge_and_refund() {
        let customer = Customer::new(1, "Ada", "Main St", 10, 100);
        customer.charge(60).unwrap();
        assert_eq!(customer.available_credit(), 40);

        let err = customer.charge(50).unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::InsufficientFunds {
                customer: 1,
                required: 50,
                available: 40
            })
        ));
        assert_eq!(customer.available_credit(), 40);

        customer.refund(60);
        assert_eq!(customer.available_credit(), 100);
    }

    #[test]
    fn test_concurrent_charges_never_overdraw() {
        let customer = Arc::new(Customer::new(2, "Bo", "Elm St", 3, 1_000));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let customer = Arc::clone(&customer);
                thread::spawn(move || (0..20).filter(|_| customer.charge(7).is_ok()).count())
            })
            .collect();

        let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(successes, 1_000 / 7);
        assert_eq!(customer.available_credit(), 1_000 % 7);
    }

    #[test]
    fn test_serializes_current_credit() {
        let customer = Customer::new(3, "Cy", "Oak St", 1, 30);
        customer.charge(10).unwrap();
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["credit"], 20);
        assert_eq!(json["name"], "Cy");
    }
}
