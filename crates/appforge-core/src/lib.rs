pub mod action;
pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod page;
pub mod policy;
pub mod service;
pub mod store;
pub mod types;
pub mod view;

pub use error::{CollectionError, Result};
