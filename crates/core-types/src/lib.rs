pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, OrderStatus, OrderType};
pub use error::FetchError;
pub use structs::{AccountSnapshot, Order, PnlPoint, Position, TimeRange, Trade};
