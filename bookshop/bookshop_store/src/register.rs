//! The money register: an append-only list of receipts.

use crate::customer::Customer;
use crate::receipt::OrderReceipt;
use crate::snapshot::Snapshot;
use bookshop_concurrency::{LockStats, TrackedMutex};
use bookshop_core::Result;
use log::debug;

/// Store finances
pub struct MoneyRegister {
    receipts: TrackedMutex<Vec<OrderReceipt>>,
}

impl MoneyRegister {
    /// Create an empty register
    pub fn new() -> Self {
        Self {
            receipts: TrackedMutex::with_name(Vec::new(), "money-register"),
        }
    }

    /// Record a completed sale
    pub fn file(&self, receipt: OrderReceipt) {
        debug!(
            "Filing receipt {} for '{}' ({})",
            receipt.id, receipt.book_title, receipt.price
        );
        self.receipts.lock().push(receipt);
    }

    /// Sum of all filed receipts
    pub fn total_earnings(&self) -> u64 {
        self.receipts
            .lock()
            .iter()
            .map(|receipt| u64::from(receipt.price))
            .sum()
    }

    /// Charge `amount` to the customer's credit card
    pub fn charge_credit_card(&self, customer: &Customer, amount: u32) -> Result<()> {
        customer.charge(amount)
    }

    /// Copy of every filed receipt, in filing order
    pub fn receipts(&self) -> Vec<OrderReceipt> {
        self.receipts.lock().clone()
    }

    /// Number of filed receipts
    pub fn len(&self) -> usize {
        self.receipts.lock().len()
    }

    /// Whether no receipt has been filed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contention on the register lock
    pub fn lock_stats(&self) -> LockStats {
        self.receipts.stats()
    }
}

impl Default for MoneyRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot for MoneyRegister {
    type Output = Vec<OrderReceipt>;

    fn snapshot(&self) -> Self::Output {
        self.receipts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_core::id::OrderId;
    use std::sync::Arc;
    use std::thread;

    fn receipt(price: u32) -> OrderReceipt {
        OrderReceipt::new(OrderId::new(), "seller-0", 1, "Dune", price, 0)
    }

    #[test]
    fn test_file_and_total() {
        let register = MoneyRegister::new();
        assert!(register.is_empty());
        assert_eq!(register.total_earnings(), 0);

        register.file(receipt(40));
        register.file(receipt(12));
        assert_eq!(register.len(), 2);
        assert_eq!(register.total_earnings(), 52);
        assert_eq!(register.receipts()[1].price, 12);
    }

    #[test]
    fn test_charge_credit_card() {
        let register = MoneyRegister::new();
        let customer = Customer::new(1, "Ada", "Main St", 4, 50);
        register.charge_credit_card(&customer, 30).unwrap();
        assert!(register.charge_credit_card(&customer, 30).is_err());
        assert_eq!(customer.available_credit(), 20);
    }

    #[test]
    fn test_concurrent_filing_loses_nothing() {
        let register = Arc::new(MoneyRegister::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let register = Arc::clone(&register);
                thread::spawn(move || {
                    for _ in 0..100 {
                        register.file(receipt(3));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(register.len(), 800);
        assert_eq!(register.total_earnings(), 2_400);
    }

    #[test]
    fn test_write_snapshot() {
        let register = MoneyRegister::new();
        register.file(receipt(40));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipts.json");
        register.write_snapshot(&path).unwrap();

        let written: Vec<OrderReceipt> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, register.receipts());
    }
}
