//! Backend for the Ridgeline motorcycle expedition site: rider permit
//! applications, the public tour/fleet/pit-stop catalog, and the admin
//! back-office that reviews permits and curates content.

pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod workflows;

pub use app::Backend;
