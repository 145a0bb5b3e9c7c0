#![forbid(unsafe_code)]

pub mod kv;
pub mod repository;
pub mod sqlite;
