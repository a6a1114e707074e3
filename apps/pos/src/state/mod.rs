//! # State Module
//!
//! Service state, one type per concern.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │    CartState     │  │   ConfigState    │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  Arc<Mutex<      │  │  store_name      │          │
//! │  │  (SQLite     │  │    Session       │  │  receipt_width   │          │
//! │  │   pool)      │  │  >>              │  │  cashier         │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: Protected by Arc<Mutex<T>> for exclusive access          │
//! │  • ConfigState: Read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands declare exactly the state they need, e.g.
//! `add_to_cart(&DbState, &CartState, ..)`.

mod cart;
mod config;
mod db;

pub use cart::{CartState, Session};
pub use config::ConfigState;
pub use db::DbState;
