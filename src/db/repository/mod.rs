pub mod audit;
pub mod execution;
pub mod notification;
pub mod schedule;
pub mod tenant;
