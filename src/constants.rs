/// Column and value constants for the sales report exported by the order system.
/// These are the defaults; every one of them can be overridden in the config file.

// Report column names
pub const COL_ID: &str = "Codigo Cliente";
pub const COL_NAME: &str = "Cliente";
pub const COL_PHONE: &str = "Fone Fixo";
pub const COL_ORDERS_SENT: &str = "Quant. Pedidos Enviados";
pub const COL_STATUS: &str = "Status";
pub const COL_ORDER_ID: &str = "N. Pedido";
pub const COL_TOTAL_VALUE: &str = "Valor Total";

/// Status label of an order that was saved but never sent
pub const SAVED_ORDER_STATUS: &str = "Pedido Salvo";

/// Substituted for "orders sent" values that do not parse as a number.
/// Never equal to the qualifying count of zero.
pub const ORDERS_SENT_SENTINEL: f64 = -1.0;

/// Country prefix prepended to national phone numbers (Brazil)
pub const PHONE_COUNTRY_PREFIX: &str = "55";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Distinct uploads kept in the qualifier cache before the oldest is dropped
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

pub const DEFAULT_CONFIG_FILE: &str = "cart_recovery.toml";

// Environment overrides
pub const ENV_WEBHOOK_URL: &str = "CART_RECOVERY_WEBHOOK_URL";
pub const ENV_TIMEOUT_SECONDS: &str = "CART_RECOVERY_TIMEOUT_SECONDS";
