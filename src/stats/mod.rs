pub mod histogram;
pub mod table_stats;
