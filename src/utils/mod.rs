pub mod async_task;
pub mod logger;
pub mod time;
pub mod util;
