//! Order receipts.

use bookshop_core::id::{OrderId, ReceiptId};
use serde::{Deserialize, Serialize};

/// Proof of a completed sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Receipt identifier
    pub id: ReceiptId,

    /// Order the receipt belongs to
    pub order_id: OrderId,

    /// Name of the seller that processed the order
    pub seller: String,

    /// Customer who paid
    pub customer_id: u32,

    /// Title that was sold
    pub book_title: String,

    /// Amount charged
    pub price: u32,

    /// Tick at which the receipt was issued
    pub issued_tick: u64,

    /// Tick at which the order was placed
    pub order_tick: u64,

    /// Tick at which the seller started processing the order
    pub processed_tick: u64,
}

impl OrderReceipt {
    /// Start a receipt for `order_id`; ticks default to the order tick
    pub fn new(
        order_id: OrderId,
        seller: impl Into<String>,
        customer_id: u32,
        book_title: impl Into<String>,
        price: u32,
        order_tick: u64,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            order_id,
            seller: seller.into(),
            customer_id,
            book_title: book_title.into(),
            price,
            issued_tick: order_tick,
            order_tick,
            processed_tick: order_tick,
        }
    }

    /// Set the processing and issue ticks
    pub fn stamped(mut self, processed_tick: u64, issued_tick: u64) -> Self {
        self.processed_tick = processed_tick;
        self.issued_tick = issued_tick;
        self
    }
}
