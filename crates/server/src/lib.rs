pub mod api;
pub mod bot;
pub mod state;
