pub mod aggregate;
pub mod app;
pub mod autoexport;
pub mod config;
pub mod consts;
pub mod error;
pub mod history;
pub mod persist;
pub mod session;
pub mod settlement;
pub mod state;
pub mod tabular;
pub mod util;
// cmd and reports belong to the binary (see main.rs).
