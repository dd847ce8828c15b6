pub mod atmospheres;
pub mod control;
pub mod day;
pub mod items;
pub mod kiosk;
pub mod settings;
pub mod test_mode;
pub mod themes;
pub mod videos;
