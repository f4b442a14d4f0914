pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{performance, performance_on, staged_performance};
