pub mod info;
pub mod rate;
pub mod setup;
pub mod ui;
