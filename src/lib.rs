pub mod annotations;
pub mod config;
pub mod dedup;
pub mod demographics;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fs_util;
pub mod geography;
pub mod hierarchy;
pub mod lookups;
pub mod mapper;
pub mod output;
pub mod pipeline;
pub mod problems;
pub mod strain;
