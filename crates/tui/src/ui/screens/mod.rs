pub mod connect;
pub mod items;
