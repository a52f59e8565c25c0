//! Domain entities stored in the single-table design.
//!
//! Every entity carries ISO-8601 creation/update timestamps, and the
//! soft-deletable ones an optional `deleted_at` marker. Entities that the
//! store should purge on its own carry `expires_at` in Unix seconds.

mod audit;
mod cart;
mod discount;
mod etsy;
mod notification;
mod order;
mod personaggio;
mod product;

pub use audit::AuditLog;
pub use cart::{BulkOutcome, Cart, CartItem};
pub use discount::{DiscountCode, DiscountKind};
pub use etsy::{EtsyOauthToken, EtsyProduct, EtsyReceipt, EtsySyncConfig};
pub use notification::Notification;
pub use order::{Order, OrderItem, OrderStatus};
pub use personaggio::Personaggio;
pub use product::{Product, ProductStatus, ProductVariant};
