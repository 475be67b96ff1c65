//! In-memory order-service back end and the standard action set.
//!
//! The store mimics a small commerce database: users with balances,
//! orders with a lifecycle status, and per-item stock counts. The
//! [`standard_actions`] registry exposes it to scripts through the
//! conventional environment keys (`user_id`, `order_id`, `item_name`,
//! `amount`), so a script queries by storing an id first and reading the
//! result variables the action leaves behind.

use crate::interpreter::{ActionError, ActionRegistry, ActionResult, Environment, Value};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Just created by a script.
    Created,
    /// Placed but not yet paid.
    Pending,
    /// Paid, awaiting processing.
    Paid,
    /// Being prepared for shipment.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled before shipment.
    Cancelled,
    /// Cancelled after payment was returned.
    Refunded,
}

impl OrderStatus {
    /// Display name, as stored in `order_status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Display name.
    pub name: String,
    /// Account balance.
    pub balance: f64,
}

/// One order on file.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Owning user.
    pub user_id: String,
    /// Ordered item.
    pub item: String,
    /// Order total.
    pub amount: f64,
    /// Current lifecycle status.
    pub status: OrderStatus,
}

/// In-memory users, orders, and stock.
///
/// Orders live in a `BTreeMap` so listings come out in id order no matter
/// the insertion sequence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: HashMap<String, UserRecord>,
    orders: BTreeMap<String, OrderRecord>,
    stock: Vec<(String, u32)>,
    order_counter: u32,
}

impl MemoryStore {
    /// Empty store; created order ids start at `N1000`.
    pub fn new() -> Self {
        Self {
            order_counter: 999,
            ..Self::default()
        }
    }

    /// Store pre-loaded with two users, three orders, and stock for the
    /// items those orders reference.
    pub fn with_demo_data() -> Self {
        let mut store = Self::new();
        store.users.insert(
            "1001".into(),
            UserRecord {
                name: "Alice".into(),
                balance: 50.0,
            },
        );
        store.users.insert(
            "1002".into(),
            UserRecord {
                name: "Bob".into(),
                balance: 120.0,
            },
        );
        store.orders.insert(
            "A001".into(),
            OrderRecord {
                user_id: "1001".into(),
                item: "Book".into(),
                amount: 30.0,
                status: OrderStatus::Shipped,
            },
        );
        store.orders.insert(
            "A002".into(),
            OrderRecord {
                user_id: "1001".into(),
                item: "Pen".into(),
                amount: 5.0,
                status: OrderStatus::Paid,
            },
        );
        store.orders.insert(
            "B001".into(),
            OrderRecord {
                user_id: "1002".into(),
                item: "Laptop".into(),
                amount: 3000.0,
                status: OrderStatus::Processing,
            },
        );
        store.stock = vec![("Book".into(), 10), ("Pen".into(), 100), ("Laptop".into(), 2)];
        store
    }

    /// Look up a user.
    pub fn user(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    /// Look up an order.
    pub fn order(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.get(order_id)
    }

    /// All orders belonging to `user_id`, in id order.
    pub fn orders_for(&self, user_id: &str) -> Vec<(&str, &OrderRecord)> {
        self.orders
            .iter()
            .filter(|(_, order)| order.user_id == user_id)
            .map(|(id, order)| (id.as_str(), order))
            .collect()
    }

    /// Insert a new order and return its generated id.
    pub fn create_order(&mut self, user_id: &str, item: &str, amount: f64) -> String {
        self.order_counter += 1;
        let order_id = format!("N{}", self.order_counter);
        self.orders.insert(
            order_id.clone(),
            OrderRecord {
                user_id: user_id.into(),
                item: item.into(),
                amount,
                status: OrderStatus::Created,
            },
        );
        order_id
    }

    /// True while the order may still be cancelled.
    pub fn cancel_eligible(&self, order_id: &str) -> bool {
        self.orders.get(order_id).is_some_and(|order| {
            !matches!(
                order.status,
                OrderStatus::Shipped
                    | OrderStatus::Delivered
                    | OrderStatus::Cancelled
                    | OrderStatus::Refunded
            )
        })
    }

    /// True only before the order is paid.
    pub fn modify_eligible(&self, order_id: &str) -> bool {
        self.orders
            .get(order_id)
            .is_some_and(|order| order.status == OrderStatus::Pending)
    }

    /// Stock check by fuzzy item name.
    ///
    /// The lookup matches the first stock entry whose name contains
    /// `item` case-insensitively, and reports both availability for
    /// `quantity` units and the current count.
    pub fn stock_available(&self, item: &str, quantity: u32) -> (bool, u32) {
        let wanted = item.to_lowercase();
        for (name, count) in &self.stock {
            if name.to_lowercase().contains(&wanted) {
                return (*count >= quantity, *count);
            }
        }
        (false, 0)
    }

    /// Cancel the order if its status still allows it.
    pub fn cancel_order(&mut self, order_id: &str) -> bool {
        if !self.cancel_eligible(order_id) {
            return false;
        }
        if let Some(order) = self.orders.get_mut(order_id) {
            order.status = OrderStatus::Cancelled;
            return true;
        }
        false
    }

    /// Add `delta` to the user's balance and return the new value.
    pub fn increase_balance(&mut self, user_id: &str, delta: f64) -> Option<f64> {
        let user = self.users.get_mut(user_id)?;
        user.balance += delta;
        Some(user.balance)
    }
}

/// Shared handle the action closures capture.
pub type StoreHandle = Arc<Mutex<MemoryStore>>;

/// A fresh handle over the demo data set.
pub fn demo_store() -> StoreHandle {
    Arc::new(Mutex::new(MemoryStore::with_demo_data()))
}

fn required(env: &Environment, key: &str, action: &'static str) -> ActionResult<String> {
    let value = env.render(key);
    if value.is_empty() {
        return Err(ActionError::failed(action, format!("missing {key}")));
    }
    Ok(value)
}

fn number(env: &Environment, key: &str) -> Option<f64> {
    env.get(key).and_then(Value::as_number)
}

/// An operand is a variable when the environment knows it, a literal
/// number otherwise.
fn operand(env: &Environment, token: &str) -> Option<f64> {
    match env.get(token) {
        Some(value) => value.as_number(),
        None => token.trim().parse().ok(),
    }
}

/// Registry with the standard action set bound to `store`.
///
/// | Action | Reads | Writes |
/// |---|---|---|
/// | `LocalSetVar name` | utterance | `name` |
/// | `Compute t = a op b` | operands | `t` |
/// | `QueryUser` | `user_id` | `user_exists`, `user_name`, `balance` |
/// | `QueryOrders` | `user_id` | `orders` |
/// | `QueryOrderStatus` | `order_id` | `order_exists`, `order_status` |
/// | `CheckCancelEligibility` | `order_id` | `cancel_eligible` |
/// | `CheckModifyEligibility` | `order_id` | `modify_eligible` |
/// | `CheckStock` | `item_name`, `quantity` | `stock_available`, `current_stock` |
/// | `CancelOrder` | `order_id` | `order_status`, `cancel_done` |
/// | `CreateOrder` | `user_id`, `item_name`, `amount` | `order_id` |
/// | `IncreaseBalance` | `user_id`, `amount` | `balance` |
/// | `Log text…` | args | nothing |
pub fn standard_actions(store: StoreHandle) -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    registry.register("LocalSetVar", |env, utterance, args| {
        let Some(name) = args.first() else {
            return Err(ActionError::failed("LocalSetVar", "missing variable name"));
        };
        env.set(name.clone(), utterance);
        Ok(())
    });

    registry.register("Compute", |env, _, args| {
        // Shape: target = a op b.
        if args.len() != 5 || args[1] != "=" {
            return Err(ActionError::failed("Compute", "expected 'target = a op b'"));
        }
        let lhs = operand(env, &args[2])
            .ok_or_else(|| ActionError::failed("Compute", format!("bad operand '{}'", args[2])))?;
        let rhs = operand(env, &args[4])
            .ok_or_else(|| ActionError::failed("Compute", format!("bad operand '{}'", args[4])))?;
        let result = match args[3].as_str() {
            "+" => lhs + rhs,
            "-" => lhs - rhs,
            "*" => lhs * rhs,
            "/" => {
                if rhs == 0.0 {
                    return Err(ActionError::failed("Compute", "division by zero"));
                }
                lhs / rhs
            }
            op => return Err(ActionError::failed("Compute", format!("bad operator '{op}'"))),
        };
        env.set(args[0].clone(), result);
        Ok(())
    });

    let handle = store.clone();
    registry.register("QueryUser", move |env, _, _| {
        let user_id = required(env, "user_id", "QueryUser")?;
        match handle.lock().user(&user_id) {
            Some(user) => {
                env.set("user_exists", true);
                env.set("user_name", user.name.clone());
                env.set("balance", user.balance);
            }
            None => env.set("user_exists", false),
        }
        Ok(())
    });

    let handle = store.clone();
    registry.register("QueryOrders", move |env, _, _| {
        let user_id = required(env, "user_id", "QueryOrders")?;
        let store = handle.lock();
        let lines: Vec<String> = store
            .orders_for(&user_id)
            .into_iter()
            .map(|(id, order)| format!("{id}({}, {})", order.item, order.status))
            .collect();
        let summary = if lines.is_empty() {
            "no orders".to_string()
        } else {
            lines.join(", ")
        };
        env.set("orders", summary);
        Ok(())
    });

    let handle = store.clone();
    registry.register("QueryOrderStatus", move |env, _, _| {
        let order_id = required(env, "order_id", "QueryOrderStatus")?;
        match handle.lock().order(&order_id) {
            Some(order) => {
                env.set("order_exists", true);
                env.set("order_status", order.status.as_str());
            }
            None => {
                env.set("order_exists", false);
                env.set("order_status", "order not found");
            }
        }
        Ok(())
    });

    let handle = store.clone();
    registry.register("CheckCancelEligibility", move |env, _, _| {
        let order_id = required(env, "order_id", "CheckCancelEligibility")?;
        env.set("cancel_eligible", handle.lock().cancel_eligible(&order_id));
        Ok(())
    });

    let handle = store.clone();
    registry.register("CheckModifyEligibility", move |env, _, _| {
        let order_id = required(env, "order_id", "CheckModifyEligibility")?;
        env.set("modify_eligible", handle.lock().modify_eligible(&order_id));
        Ok(())
    });

    let handle = store.clone();
    registry.register("CheckStock", move |env, _, _| {
        let item = required(env, "item_name", "CheckStock")?;
        let quantity = number(env, "quantity").unwrap_or(1.0).max(0.0) as u32;
        let (available, current) = handle.lock().stock_available(&item, quantity);
        env.set("stock_available", available);
        env.set("current_stock", f64::from(current));
        Ok(())
    });

    let handle = store.clone();
    registry.register("CancelOrder", move |env, _, _| {
        let order_id = required(env, "order_id", "CancelOrder")?;
        let mut store = handle.lock();
        if store.cancel_order(&order_id) {
            env.set("order_status", OrderStatus::Cancelled.as_str());
            env.set("cancel_done", true);
            Ok(())
        } else {
            env.set("cancel_done", false);
            Err(ActionError::failed(
                "CancelOrder",
                format!("order {order_id} cannot be cancelled"),
            ))
        }
    });

    let handle = store.clone();
    registry.register("CreateOrder", move |env, _, _| {
        let user_id = required(env, "user_id", "CreateOrder")?;
        let item = required(env, "item_name", "CreateOrder")?;
        let amount = number(env, "amount").unwrap_or(0.0);
        let order_id = handle.lock().create_order(&user_id, &item, amount);
        info!(%order_id, %user_id, "order created");
        env.set("order_id", order_id);
        Ok(())
    });

    let handle = store.clone();
    registry.register("IncreaseBalance", move |env, _, _| {
        let user_id = required(env, "user_id", "IncreaseBalance")?;
        let delta = number(env, "amount").unwrap_or(0.0);
        match handle.lock().increase_balance(&user_id, delta) {
            Some(balance) => {
                env.set("balance", balance);
                Ok(())
            }
            None => Err(ActionError::failed(
                "IncreaseBalance",
                format!("no such user {user_id}"),
            )),
        }
    });

    registry.register("Log", |_, _, args| {
        info!(text = %args.join(" "), "script log");
        Ok(())
    });

    registry
}
