//! Order processing on the worker pool.
//!
//! Orders are submitted in tick order. A worker waits until its order's tick
//! comes up, then sells the book and sends it out with the first free
//! vehicle. Paid orders that find no vehicle before the acquisition deadline
//! are counted as undelivered.

use bookshop_concurrency::{ResourcePoolError, WorkerPool};
use bookshop_core::error::{Result, StoreError};
use bookshop_core::log_event;
use bookshop_core::utils::LogLevel;
use bookshop_core::{Error, OrderId};
use bookshop_store::{OrderReceipt, Store};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// An order waiting to be processed
#[derive(Debug, Clone)]
pub struct PendingOrder {
    pub id: OrderId,
    pub customer_id: u32,
    pub title: String,
    pub tick: u64,
}

/// What happened to one order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Paid and delivered
    Delivered,

    /// Paid, but no vehicle became free in time
    Undelivered,

    /// Out of stock or the customer could not pay
    Declined,
}

/// Counts of order outcomes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub completed: usize,
    pub declined: usize,
    pub deliveries: usize,
    pub undelivered: usize,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicUsize,
    undelivered: AtomicUsize,
    declined: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Delivered => &self.delivered,
            Outcome::Undelivered => &self.undelivered,
            Outcome::Declined => &self.declined,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self) -> Summary {
        let delivered = self.delivered.load(Ordering::Relaxed);
        let undelivered = self.undelivered.load(Ordering::Relaxed);
        Summary {
            completed: delivered + undelivered,
            declined: self.declined.load(Ordering::Relaxed),
            deliveries: delivered,
            undelivered,
        }
    }
}

/// Simulated clock shared by all workers
#[derive(Clone, Copy)]
struct Clock {
    start: Instant,
    tick: Duration,
}

impl Clock {
    fn now(&self) -> u64 {
        let tick_us = self.tick.as_micros().max(1);
        (self.start.elapsed().as_micros() / tick_us) as u64
    }

    fn wait_for(&self, tick: u64) {
        let due = self.start + self.tick.saturating_mul(u32::try_from(tick).unwrap_or(u32::MAX));
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
    }
}

/// Drives every configured order through the store
pub struct Simulation {
    store: Arc<Store>,
}

impl Simulation {
    /// Prepare a run over `store`
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Every configured order, sorted by tick
    pub fn orders(&self) -> Vec<PendingOrder> {
        let mut orders: Vec<PendingOrder> = self
            .store
            .config()
            .customers
            .iter()
            .flat_map(|customer| {
                customer.orders.iter().map(move |order| PendingOrder {
                    id: OrderId::new(),
                    customer_id: customer.id,
                    title: order.title.clone(),
                    tick: order.tick,
                })
            })
            .collect();
        orders.sort_by_key(|order| order.tick);
        orders
    }

    /// Process all orders and wait for the workers to finish
    pub fn run(&self) -> Result<Summary> {
        let services = &self.store.config().services;
        let workers = WorkerPool::new(services.workers)?;
        let counters = Arc::new(Counters::default());
        let clock = Clock {
            start: Instant::now(),
            tick: services.tick(),
        };

        for order in self.orders() {
            let store = Arc::clone(&self.store);
            let counters = Arc::clone(&counters);
            workers.execute_blocking(move || {
                clock.wait_for(order.tick);
                let outcome = match process_order(&store, &clock, &order) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!("Order {} failed: {}", order.id, err);
                        Outcome::Declined
                    }
                };
                counters.record(outcome);
            })?;
        }

        let stats = workers.join();
        debug!(
            "Workers done: {} tasks, {} panicked",
            stats.tasks_completed, stats.tasks_panicked
        );
        Ok(counters.summary())
    }
}

fn process_order(store: &Store, clock: &Clock, order: &PendingOrder) -> Result<Outcome> {
    let processed_tick = clock.now();
    let customer = store.customer(order.customer_id)?;

    let price = match store.inventory().reserve(&order.title) {
        Ok(price) => price,
        Err(Error::Store(StoreError::NotAvailable(_))) => {
            log_event!(LogLevel::Info, "order declined",
                order => order.id,
                reason => "not in stock",
                title => order.title,
            );
            return Ok(Outcome::Declined);
        }
        Err(err) => return Err(err),
    };

    if let Err(err) = store.register().charge_credit_card(customer, price) {
        store.inventory().restock(&order.title);
        log_event!(LogLevel::Info, "order declined",
            order => order.id,
            reason => err,
        );
        return Ok(Outcome::Declined);
    }

    let seller = thread::current()
        .name()
        .unwrap_or("seller")
        .to_string();
    let receipt = OrderReceipt::new(
        order.id,
        seller,
        customer.id(),
        order.title.clone(),
        price,
        order.tick,
    )
    .stamped(processed_tick, clock.now());
    store.register().file(receipt);

    let vehicles = store.vehicles();
    match vehicles.acquire_default() {
        Ok(vehicle) => {
            let ticks = vehicle.deliver(customer.address(), customer.distance(), clock.tick);
            log_event!(LogLevel::Debug, "order delivered",
                order => order.id,
                vehicle => vehicle.license,
                ticks => ticks,
            );
            vehicles.release(vehicle);
            Ok(Outcome::Delivered)
        }
        Err(ResourcePoolError::Timeout(waited)) => {
            log_event!(LogLevel::Warning, "no vehicle available",
                order => order.id,
                waited_ms => waited.as_millis(),
            );
            Ok(Outcome::Undelivered)
        }
    }
}
