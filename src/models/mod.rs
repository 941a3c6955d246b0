pub mod inventory;
pub mod order;
pub mod user;

pub use inventory::InventorySummary;
pub use order::{Order, OrderStatus};
pub use user::{Role, User, UserDto};
