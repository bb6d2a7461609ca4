//! Core模块 - 包含所有映射逻辑

pub mod models;
pub mod diagnostics;
pub mod resolver;
pub mod mapper;

#[cfg(test)]
mod sim_integration_tests;
