pub mod attendance;
pub mod break_slot;
pub mod location;
pub mod payroll;
pub mod role;
pub mod user;
