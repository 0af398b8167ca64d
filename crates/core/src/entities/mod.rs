mod execution;
mod market_data;
mod order;
mod order_status;
mod order_type;
mod position;
mod side;
mod subscription;

pub use execution::ExecutionReport;
pub use market_data::MarketData;
pub use order::{Order, OrderId, OrderRequest};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use position::{AccountSummary, Position};
pub use side::Side;
pub use subscription::Subscription;
