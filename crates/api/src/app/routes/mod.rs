pub mod auth;
pub mod categories;
pub mod items;
pub mod shared;
pub mod system;
pub mod workspaces;
