pub mod descriptor;
pub mod matcher;
pub mod session;
