/// interactive numbered menu
pub mod cli_main;
