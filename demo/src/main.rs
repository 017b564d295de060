use std::{fs, path::PathBuf, sync::atomic::Ordering};

use clap::{Parser, Subcommand};
use edge_frontend::Program;
use edge_witness::{inputs, CalculatorConfig, Circuit, WitnessCalculator};
use tracing::{debug, info, trace, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Layer};

mod counter;

#[derive(Parser)]
#[command(author, version, about = "Demo application for the edge witness engine", long_about = None)]
struct Cli {
  /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List the bundled programs
  List,
  /// Build a bundled program and store its circuit artifact
  Build {
    /// Program name, see `list`
    program: String,

    /// Path to save the circuit, binary if it ends in `.bin`, JSON otherwise
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Calculate a witness for a stored circuit
  Calc {
    /// Path to the circuit artifact
    #[arg(short, long)]
    circuit: PathBuf,

    /// Path to the JSON inputs
    #[arg(short, long)]
    input: PathBuf,

    /// Path to a JSON calculator configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to save the witness values as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Build a bundled program and run it on its sample inputs
  Run {
    /// Program name, see `list`
    program: String,
  },
}

fn setup_logging(verbosity: u8) {
  let level = match verbosity {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  };

  let filter = EnvFilter::from_default_env()
    .add_directive(format!("edge_witness={}", level).parse().unwrap())
    .add_directive(format!("edge_frontend={}", level).parse().unwrap())
    .add_directive(format!("witness_demo={}", level).parse().unwrap());

  // The counter sees firing events regardless of verbosity.
  let counter = counter::FiringCounterLayer.with_filter(
    EnvFilter::new("edge_witness::evaluator=debug").add_directive(LevelFilter::WARN.into()),
  );

  tracing_subscriber::registry()
    .with(fmt::layer().with_target(true).with_filter(filter))
    .with(counter)
    .init();

  debug!("Logging initialized at level: {:?}", level);
}

fn calculate(
  calculator: &WitnessCalculator,
  inputs: &edge_witness::InputMap,
) -> Result<edge_witness::Witness, Box<dyn std::error::Error>> {
  counter::reset();
  let witness = calculator.calculate(inputs)?;
  info!("✅ Calculated witness with {} signals", witness.len());
  info!("Components fired: {}", counter::FIRED_COUNTER.load(Ordering::SeqCst));
  for (template, count) in counter::fired_by_template() {
    debug!("  {template}: {count}");
  }
  for (name, values) in witness.outputs() {
    let values = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    println!("{name} = [{values}]");
  }
  Ok(witness)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_logging(cli.verbose);

  match cli.command {
    Commands::List => {
      for program in Program::ALL {
        println!("{program}");
      }
    },
    Commands::Build { program, output } => {
      let program: Program = program.parse()?;
      info!("🔧 Building {program}...");
      let circuit = program.build()?;
      info!(
        "✅ Built circuit: {} templates, {} components, {} signals",
        circuit.templates.len(),
        circuit.component_count,
        circuit.signal_count
      );
      trace!("Circuit details: {:?}", circuit);

      let output = output.unwrap_or_else(|| PathBuf::from(format!("{program}.bin")));
      circuit.store(&output)?;
      info!("✅ Saved circuit to file: {}", output.display());
    },
    Commands::Calc { circuit, input, config, output } => {
      info!("🔍 Calculating witness...");
      let artifact = Circuit::load(&circuit)?;
      info!("✅ Loaded circuit from file: {}", circuit.display());

      let config = match config {
        Some(path) => CalculatorConfig::from_json(&fs::read_to_string(path)?)?,
        None => CalculatorConfig::default(),
      };
      debug!("Calculator config: {:?}", config);

      let inputs = inputs::parse_json(&fs::read_to_string(&input)?)?;
      info!("✅ Loaded {} inputs from file: {}", inputs.len(), input.display());

      let calculator = WitnessCalculator::with_config(artifact, config)?;
      let witness = calculate(&calculator, &inputs)?;

      if let Some(output) = output {
        fs::write(&output, witness.to_json()?)?;
        info!("✅ Saved witness to file: {}", output.display());
      }
    },
    Commands::Run { program } => {
      let program: Program = program.parse()?;
      info!("🔧 Running {program} on its sample inputs...");
      let calculator = WitnessCalculator::new(program.build()?)?;
      calculate(&calculator, &program.sample_inputs())?;
    },
  }
  Ok(())
}
