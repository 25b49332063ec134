#[allow(non_snake_case)]
pub mod Checker;
#[allow(non_snake_case)]
pub mod Database;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
pub mod database_config;
