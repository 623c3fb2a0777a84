//! Sequence generator CLI.
//!
//! Provides the `seqgen` binary over the bundled demo classes:
//! `generate` runs feedback-directed generation and writes JUnit sources,
//! `check-specs` compiles a specification file, and `simplify` minimises a
//! failing sequence read from a file.
//!
//! Machine-readable results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seqgen_check::condition::{parse_specifications, read_specifications, OperationSpecification};
use seqgen_check::{
    ConditionError, ConditionOptions, ContractCheckingVisitor, ExecutableSequence, ExecutionContext,
    ForwardGenerator, GenConfig, MultiVisitor, Simplifier, SpecificationCollection,
};
use seqgen_codegen::{write_tests, CodegenError, JUnitOptions, SequencePrinter};
use seqgen_core::{OperationRegistry, Sequence, TypeRegistry};

/// Feedback-directed unit test generation.
#[derive(Parser)]
#[command(name = "seqgen", about = "Feedback-directed unit test generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate regression and error-revealing tests for the demo classes.
    Generate {
        /// PRNG seed (overrides the configuration file).
        #[arg(long)]
        seed: Option<u64>,

        /// Number of candidate sequences to try.
        #[arg(long)]
        limit: Option<usize>,

        /// Per-statement timeout in milliseconds; 0 runs inline.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Specification files. Without any, the bundled demo
        /// specifications are used.
        #[arg(long)]
        specs: Vec<PathBuf>,

        /// Root directory for generated sources.
        #[arg(short, long, default_value = "./generated-tests")]
        output: PathBuf,

        /// Package of the generated classes.
        #[arg(long)]
        package: Option<String>,

        /// Base name of the regression test classes.
        #[arg(long, default_value = "RegressionTest")]
        class_name: String,

        /// Base name of the error-revealing test classes.
        #[arg(long, default_value = "ErrorTest")]
        error_class_name: String,

        /// Generator configuration JSON.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile every condition of a specification file.
    CheckSpecs {
        /// Path to the specification JSON.
        file: PathBuf,
    },

    /// Execute a sequence and minimise it if it fails.
    Simplify {
        /// Path to a sequence in `varN = ...` form.
        sequence: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Generate {
            seed,
            limit,
            timeout_ms,
            specs,
            output,
            package,
            class_name,
            error_class_name,
            config,
        } => {
            let config = match load_config(config.as_deref()) {
                Ok(mut cfg) => {
                    if let Some(seed) = seed {
                        cfg.seed = seed;
                    }
                    if let Some(limit) = limit {
                        cfg.input_limit = limit;
                    }
                    if let Some(timeout_ms) = timeout_ms {
                        cfg.timeout_ms = timeout_ms;
                    }
                    cfg
                }
                Err(code) => process::exit(code),
            };
            let options = JUnitOptions {
                output_dir: output,
                package,
                class_name,
                tests_per_file: config.tests_per_file,
                debug: false,
            };
            run_generate(config, &specs, options, error_class_name)
        }
        Commands::CheckSpecs { file } => run_check_specs(&file),
        Commands::Simplify { sequence } => run_simplify(&sequence),
    };
    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<GenConfig, i32> {
    let Some(path) = path else {
        return Ok(GenConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read config '{}': {}", path.display(), e);
        3
    })?;
    GenConfig::from_json(&text).map_err(|e| {
        eprintln!("Error: invalid config '{}': {}", path.display(), e);
        1
    })
}

fn demo_registries() -> Result<(TypeRegistry, OperationRegistry), i32> {
    seqgen_demo::build().map_err(|e| {
        eprintln!("Error: failed to register demo classes: {}", e);
        1
    })
}

fn load_specifications(paths: &[PathBuf]) -> Result<Vec<OperationSpecification>, ConditionError> {
    if paths.is_empty() {
        return parse_specifications(seqgen_demo::SPECS_JSON);
    }
    let mut all = Vec::new();
    for path in paths {
        all.extend(read_specifications(path)?);
    }
    Ok(all)
}

fn report_condition_error(e: &ConditionError) -> i32 {
    match e {
        ConditionError::Io { .. } => {
            eprintln!("I/O error: {}", e);
            3
        }
        _ => {
            eprintln!("Specification error: {}", e);
            2
        }
    }
}

fn report_codegen_error(e: &CodegenError) -> i32 {
    match e {
        CodegenError::IoError(_) | CodegenError::Write { .. } => {
            eprintln!("I/O error: {}", e);
            3
        }
        _ => {
            eprintln!("Code generation error: {}", e);
            1
        }
    }
}

fn print_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Execute the generate subcommand.
///
/// Returns exit code: 0 = success, 1 = generation error,
/// 2 = specification error, 3 = I/O error.
fn run_generate(config: GenConfig, spec_paths: &[PathBuf], options: JUnitOptions, error_class_name: String) -> i32 {
    let (types, ops) = match demo_registries() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let specs = match load_specifications(spec_paths)
        .and_then(|s| SpecificationCollection::new(&types, &ops, s, ConditionOptions::from(&config)))
    {
        Ok(s) => s,
        Err(e) => return report_condition_error(&e),
    };

    let ctx = ExecutionContext::new(&types, config.executor()).with_specifications(&specs);
    let result = match ForwardGenerator::new(ctx, &ops, config).and_then(|mut g| g.generate()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Generation error: {}", e);
            return 1;
        }
    };

    let regression: Vec<&ExecutableSequence> = result.regression.iter().collect();
    let failures: Vec<&ExecutableSequence> = result.failures.iter().map(|f| f.reported()).collect();
    let error_options = JUnitOptions { class_name: error_class_name, ..options.clone() };

    let written = write_tests(&types, &regression, &options)
        .and_then(|r| write_tests(&types, &failures, &error_options).map(|e| (r, e)));
    match written {
        Ok((regression_files, error_files)) => {
            info!(
                regression_files = regression_files.files.len(),
                error_files = error_files.files.len(),
                written = regression_files.written + error_files.written,
                "tests written"
            );
            print_json(&json!({
                "stats": result.stats,
                "regression": regression_files,
                "errors": error_files,
            }));
            0
        }
        Err(e) => report_codegen_error(&e),
    }
}

/// Execute the check-specs subcommand.
///
/// Returns exit code: 0 = every condition compiles, 2 = specification
/// error, 3 = I/O error.
fn run_check_specs(path: &Path) -> i32 {
    let (types, ops) = match demo_registries() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let checked = read_specifications(path)
        .and_then(|s| {
            let count = s.len();
            SpecificationCollection::new(&types, &ops, s, ConditionOptions::default()).map(|c| (count, c))
        })
        .and_then(|(count, c)| c.compile_all().map(|operations| (count, operations)));
    match checked {
        Ok((specifications, operations)) => {
            print_json(&json!({ "specifications": specifications, "operations": operations }));
            0
        }
        Err(e) => report_condition_error(&e),
    }
}

/// Execute the simplify subcommand.
///
/// Returns exit code: 0 = success (also for a sequence that does not
/// fail), 1 = malformed sequence or execution error, 3 = I/O error.
fn run_simplify(path: &Path) -> i32 {
    let (types, ops) = match demo_registries() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", path.display(), e);
            return 3;
        }
    };
    let sequence = match Sequence::parse(&text, &types, &ops) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: malformed sequence: {}", e);
            return 1;
        }
    };
    let specs = match load_specifications(&[])
        .and_then(|s| SpecificationCollection::new(&types, &ops, s, ConditionOptions::default()))
    {
        Ok(s) => s,
        Err(e) => return report_condition_error(&e),
    };

    let config = GenConfig::default();
    let ctx = ExecutionContext::new(&types, config.executor()).with_specifications(&specs);
    let mut visitor = MultiVisitor::new().with(ContractCheckingVisitor::new(&types));
    let mut eseq = ExecutableSequence::new(sequence);
    if let Err(e) = eseq.execute(&ctx, &mut visitor) {
        eprintln!("Execution error: {}", e);
        return 1;
    }

    let simplified = match Simplifier::new(ctx, &mut visitor).simplify(&eseq) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Execution error: {}", e);
            return 1;
        }
    };
    let java = match SequencePrinter::new(&types).print(&simplified.executable) {
        Ok(lines) => lines,
        Err(e) => return report_codegen_error(&e),
    };
    print_json(&json!({
        "failing": eseq.has_failure(),
        "removed": simplified.removed,
        "executions": simplified.executions,
        "sequence": simplified.sequence.to_parseable_string(&types),
        "java": java,
    }));
    0
}
