//! Command implementations.
//!
//! Each submodule handles one CLI command; handlers return exit codes.

mod analyze;
mod trace;

use crate::cli::{Cli, Commands};

/// Dispatch the parsed CLI to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Analyze {
            input,
            vm_profile,
            analysis_type,
            disassembly_output_path,
            format,
            report_output_path,
            with_trace,
        } => analyze::cmd_analyze(
            input,
            vm_profile,
            *analysis_type,
            disassembly_output_path.as_deref(),
            *format,
            report_output_path.as_deref(),
            *with_trace,
        ),
        Commands::Trace {
            input,
            vm_profile,
            function,
            source_type,
        } => trace::cmd_trace(input, vm_profile, function, *source_type),
    }
}
