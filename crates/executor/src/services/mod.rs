pub mod audit_log;
pub mod execution_service;
pub mod order_sizer;
pub mod reports;
pub mod telegram_service;
pub mod trading_cycle;

#[cfg(test)]
pub mod test_support;
