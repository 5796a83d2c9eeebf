pub mod data;
pub mod poisson;
pub mod rate_limiter;
pub mod retry;
pub mod teams;
pub mod time_window;
pub mod tip_selector;
pub mod validation;
