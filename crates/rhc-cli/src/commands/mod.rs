pub mod schedule;
pub mod validate;
