pub mod device_link;
pub mod session_observer;
