pub mod app;
pub mod concurrency;
pub mod load;
pub mod logs;
pub mod nmp;
pub mod sql;
pub mod stats;
pub mod userlist;
