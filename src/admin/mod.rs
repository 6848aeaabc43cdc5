/// Admin panel services
///
/// Role definitions and the managers behind the super-admin, inventory and
/// finance areas of the panel.

pub mod coupons;
pub mod finance;
pub mod inventory;
pub mod pricing;
pub mod roles;
pub mod settings;

pub use coupons::{Coupon, CouponCheck, CouponManager};
pub use finance::{FinanceManager, FinanceRecord, FinanceSummary};
pub use inventory::{InventoryItem, InventoryManager, InventoryMovement, MovementType};
pub use pricing::{GamePricing, PricingManager};
pub use roles::Role;
pub use settings::SettingsManager;
