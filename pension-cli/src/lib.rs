pub mod app;
pub mod logging;
pub mod report;
pub mod request_csv;
pub mod utils;
