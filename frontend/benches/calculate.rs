use criterion::{black_box, criterion_group, criterion_main, Criterion};
use edge_frontend::{Program, WitnessCalculator};
use edge_witness::CalculatorConfig;

pub fn bench_calculate(c: &mut Criterion) {
  for program in [Program::LessThan, Program::Contains, Program::SwitchArray, Program::Classify] {
    let circuit = program.build().expect("program builds");
    let inputs = program.sample_inputs();

    let calculator = WitnessCalculator::new(circuit.clone()).expect("valid circuit");
    c.bench_function(&format!("calculate {program}"), |b| {
      b.iter(|| calculator.calculate(black_box(&inputs)).expect("witness"))
    });

    let config = CalculatorConfig { release_components: false, ..CalculatorConfig::default() };
    let calculator = WitnessCalculator::with_config(circuit, config).expect("valid circuit");
    c.bench_function(&format!("calculate {program} without release"), |b| {
      b.iter(|| calculator.calculate(black_box(&inputs)).expect("witness"))
    });
  }
}

criterion_group!(benches, bench_calculate);
criterion_main!(benches);
