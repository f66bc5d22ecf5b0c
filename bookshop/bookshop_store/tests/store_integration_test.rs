//! Integration tests running many sellers against one shared store.

use bookshop_core::utils::{BookConfig, CustomerConfig, VehicleConfig};
use bookshop_core::{OrderId, StoreConfig};
use bookshop_store::{OrderReceipt, Snapshot, Store};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn customer(id: u32, credit: u32) -> CustomerConfig {
    CustomerConfig {
        id,
        name: format!("customer-{}", id),
        address: format!("{} Main St", id),
        distance: 4,
        credit,
        orders: Vec::new(),
    }
}

fn config() -> StoreConfig {
    StoreConfig {
        books: vec![
            BookConfig {
                title: "Dune".to_string(),
                amount: 10,
                price: 30,
            },
            BookConfig {
                title: "Emma".to_string(),
                amount: 3,
                price: 10,
            },
        ],
        vehicles: vec![
            VehicleConfig { license: 1, speed: 2 },
            VehicleConfig { license: 2, speed: 4 },
        ],
        customers: (1..=6).map(|id| customer(id, 60)).collect(),
        ..Default::default()
    }
}

/// Sell one copy of `title` to `customer_id` and deliver it
fn sell(store: &Store, seller: &str, customer_id: u32, title: &str) -> bool {
    let customer = store.customer(customer_id).unwrap();
    let Ok(price) = store.inventory().reserve(title) else {
        return false;
    };
    if store.register().charge_credit_card(customer, price).is_err() {
        store.inventory().restock(title);
        return false;
    }
    store.register().file(OrderReceipt::new(
        OrderId::new(),
        seller,
        customer_id,
        title,
        price,
        0,
    ));

    let vehicle = store.vehicles().acquire().get().unwrap();
    vehicle.deliver(customer.address(), customer.distance(), Duration::from_micros(50));
    store.vehicles().release(vehicle);
    true
}

#[test]
fn test_concurrent_sellers_keep_books_and_money_consistent() {
    let store = Arc::new(Store::from_config(&config()).unwrap());

    let sellers: Vec<_> = (0..6)
        .map(|seller| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let name = format!("seller-{}", seller);
                let mut sold = 0usize;
                for customer_id in 1..=6 {
                    for title in ["Dune", "Emma"] {
                        if sell(&store, &name, customer_id, title) {
                            sold += 1;
                        }
                    }
                }
                sold
            })
        })
        .collect();

    let sold: usize = sellers.into_iter().map(|s| s.join().unwrap()).sum();

    let register = store.register();
    assert_eq!(register.len(), sold);

    // every receipt is matched by a missing copy and by spent credit
    let inventory = store.inventory();
    let dune_sold = 10 - inventory.amount_of("Dune").unwrap() as usize;
    let emma_sold = 3 - inventory.amount_of("Emma").unwrap() as usize;
    assert_eq!(dune_sold + emma_sold, sold);

    let spent: u64 = store
        .customers()
        .map(|c| u64::from(60 - c.available_credit()))
        .sum();
    assert_eq!(register.total_earnings(), spent);
    assert_eq!(spent, (dune_sold * 30 + emma_sold * 10) as u64);

    assert_eq!(store.vehicles().idle_count(), 2);
    assert_eq!(store.vehicles().pending_count(), 0);
}

#[test]
fn test_snapshots_written_after_shutdown() {
    let store = Store::from_config(&config()).unwrap();
    assert!(sell(&store, "seller-0", 1, "Emma"));
    assert!(sell(&store, "seller-0", 2, "Dune"));

    let dir = tempfile::tempdir().unwrap();
    let inventory_path = dir.path().join("inventory.json");
    let receipts_path = dir.path().join("receipts.json");
    store.inventory().write_snapshot(&inventory_path).unwrap();
    store.register().write_snapshot(&receipts_path).unwrap();

    let inventory: BTreeMap<String, u32> =
        serde_json::from_str(&std::fs::read_to_string(&inventory_path).unwrap()).unwrap();
    assert_eq!(inventory.get("Emma"), Some(&2));
    assert_eq!(inventory.get("Dune"), Some(&9));

    let receipts: Vec<OrderReceipt> =
        serde_json::from_str(&std::fs::read_to_string(&receipts_path).unwrap()).unwrap();
    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[0].book_title, "Emma");
    assert_eq!(receipts[1].customer_id, 2);
}
