pub mod clock;
pub mod db_utils;
pub mod employee_filter;
pub mod roster_cache;
