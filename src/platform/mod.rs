mod win32;

pub use win32::*;
