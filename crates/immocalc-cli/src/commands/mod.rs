pub mod projection;
pub mod time_value;
