pub mod cli;
pub mod config;
pub mod ingest;
pub mod loadgen;
pub mod storage;
pub mod web;
