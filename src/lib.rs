pub mod auction;
pub mod bidding;
pub mod database;
pub mod handlers;
pub mod query;
pub mod realtime;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod ws;
