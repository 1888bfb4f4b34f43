pub mod device_bar;
pub mod time_fmt;
