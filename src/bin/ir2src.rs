//! ir2src - correlate TIR modules with their source line ranges
//!
//! Runs the source correlation pass over a textual test IR module and prints
//! the resulting block, loop and function ranges, loop labels and begin-line
//! candidates.

use std::{fs, path::PathBuf};

use clap::{Parser, ValueEnum};
use ir2src::{
    core::{Analyzer, CorrelationConfig, CorrelationError, IntrinsicPolicy, LabelTieBreak},
    srcmap::{render_trace, ReportSection, SourceMapPass},
    test_ir::{AnnotatedTripCounts, TestIR, TestIRAdaptor},
};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse module: {0}")]
    Parse(String),
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
}

/// Map IR blocks, loops and functions back to source line ranges
#[derive(Parser, Debug)]
#[command(name = "ir2src", version, rename_all = "kebab-case")]
struct Cli {
    /// Input TIR file to analyze
    #[arg(required = true)]
    input: PathBuf,

    /// Report section to print
    #[arg(short, long, value_enum, default_value_t = Section::All)]
    section: Section,

    /// Stop aggregating a block at its first intrinsic call
    #[arg(long)]
    truncate_on_intrinsic: bool,

    /// Link-name prefix identifying intrinsics
    #[arg(long, default_value = "llvm.")]
    intrinsic_prefix: String,

    /// Maximum number of inlining levels followed per location
    #[arg(long, default_value_t = 256)]
    max_inline_depth: usize,

    /// Loop chosen when a label matches several loops
    #[arg(long, value_enum, default_value_t = TieBreak::Innermost)]
    tie_break: TieBreak,

    /// Print session statistics after the report
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    /// Per-block source ranges
    Blocks,
    /// Loop ranges, depths and trip counts
    Loops,
    /// Function ranges
    Functions,
    /// Loop labels
    Labels,
    /// Begin-line candidates per function
    BeginLines,
    /// Resolved location of every instruction
    Trace,
    /// The parsed module
    Ir,
    /// Every report section
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreak {
    /// Deepest matching loop
    Innermost,
    /// First matching loop in discovery order
    First,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.input)?;
    let ir = TestIR::parse(&text).map_err(Error::Parse)?;

    let config = CorrelationConfig {
        intrinsic_prefix: cli.intrinsic_prefix.clone(),
        intrinsic_policy: if cli.truncate_on_intrinsic {
            IntrinsicPolicy::TruncateBlock
        } else {
            IntrinsicPolicy::SkipInstruction
        },
        max_inline_depth: cli.max_inline_depth,
        label_tie_break: match cli.tie_break {
            TieBreak::Innermost => LabelTieBreak::Innermost,
            TieBreak::First => LabelTieBreak::FirstDiscovered,
        },
        ..CorrelationConfig::default()
    };

    match cli.section {
        Section::Ir => {
            print!("{}", ir.print());
            return Ok(());
        }
        Section::Trace => {
            let mut adaptor = TestIRAdaptor::new(&ir);
            println!("{}", render_trace(&mut adaptor, &config)?);
            return Ok(());
        }
        _ => {}
    }

    let sections: Vec<ReportSection> = match cli.section {
        Section::Blocks => vec![ReportSection::Blocks],
        Section::Loops => vec![ReportSection::Loops],
        Section::Functions => vec![ReportSection::Functions],
        Section::Labels => vec![ReportSection::Labels],
        Section::BeginLines => vec![ReportSection::BeginLines],
        _ => ReportSection::ALL.to_vec(),
    };

    let mut adaptor = TestIRAdaptor::new(&ir);
    let mut analyzer = Analyzer::<TestIRAdaptor>::new();
    let mut pass = SourceMapPass::new(config);
    let maps = pass.run_on_module(&mut adaptor, &mut analyzer, &AnnotatedTripCounts)?;

    for section in sections {
        let report = maps.render(section);
        if !report.is_empty() {
            println!("{}", report);
        }
    }

    if cli.stats {
        println!("{}", pass.stats());
    }

    Ok(())
}
