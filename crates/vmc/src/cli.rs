//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "vmc")]
#[command(about = "Checks compiled MIPS programs against a VM compatibility profile")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the program's compatibility against the VM profile
    Analyze {
        /// Program to analyze: an ELF binary, a saved disassembly
        /// listing, or an HLIR module (.json)
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Path to the VM profile config file
        #[arg(long, value_name = "FILE")]
        vm_profile: PathBuf,

        /// Type of analysis to perform; both when unset
        #[arg(long, value_enum)]
        analysis_type: Option<AnalysisTypeArg>,

        /// File path to store the disassembled assembly code
        #[arg(long, value_name = "FILE")]
        disassembly_output_path: Option<PathBuf>,

        /// Output format of the report
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        /// Output file path for the report; stdout when unset
        #[arg(long, value_name = "FILE")]
        report_output_path: Option<PathBuf>,

        /// Include full call chains in the report
        #[arg(long)]
        with_trace: bool,
    },
    /// Generate the call chain for a given function
    Trace {
        /// Program to trace through (same forms as `analyze`)
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Path to the VM profile config file
        #[arg(long, value_name = "FILE")]
        vm_profile: PathBuf,

        /// Function to trace, qualified with its package, e.g.
        /// `syscall.read`
        #[arg(long)]
        function: String,

        /// Trace over the program IR (`go`) or the disassembly
        /// (`assembly`)
        #[arg(long, value_enum, default_value = "assembly")]
        source_type: SourceTypeArg,
    },
}

/// Which analyzer(s) to run.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AnalysisTypeArg {
    Opcode,
    Syscall,
}

/// Report output format.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum FormatArg {
    /// Human-readable report (default)
    #[default]
    Text,
    /// JSON array of issues
    Json,
}

/// Source form for the trace subcommand.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum SourceTypeArg {
    /// Trace over the parsed disassembly (default)
    #[default]
    Assembly,
    /// Trace over the compiled program's IR module
    Go,
}
