/// simplelog setup of the binary
pub mod logger;
