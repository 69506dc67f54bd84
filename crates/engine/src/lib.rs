//! Adherence computation and reminder dispatch.

pub mod adherence;
pub mod clock;
pub mod directory;
pub mod dispatch;
pub mod medication;
pub mod message;
pub mod notification_setting;
pub mod throttle;
