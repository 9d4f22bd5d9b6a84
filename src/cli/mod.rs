//! Operator CLI support

pub mod commands;

pub use commands::{
    cmd_calibrate, cmd_entry, cmd_handle, cmd_price, load_config, BatchEntry, CliResult,
    MultiplierChoice,
};
