// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, picks the Burn backend, and
// prints results. All real work is delegated to Layer 2.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{NdArray, Wgpu};
use clap::Parser;
use commands::{BackendKind, Commands, InitConfigArgs, InspectArgs, PredictArgs};

use crate::application::{
    init_config_use_case::InitConfigUseCase,
    inspect_use_case::{InspectUseCase, ReaderSummary},
    predict_use_case::PredictUseCase,
};
use crate::data::{loader::JsonExampleLoader, synthetic::SyntheticExamples};
use crate::domain::{span::Prediction, traits::ExampleSource};
use crate::infra::config_store::ConfigStore;
use crate::ml::model::ReaderConfig;

#[derive(Parser, Debug)]
#[command(
    name = "fusionnet-reader",
    version,
    about = "FusionNet machine reading comprehension: rank answer spans in tokenized documents."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::InitConfig(args) => run_init_config(args),
            Commands::Inspect(args)    => run_inspect(args),
            Commands::Predict(args)    => run_predict(args),
        }
    }
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    let cfg = ReaderConfig::from(&args);
    InitConfigUseCase::new(ConfigStore::new(&args.config), args.force).execute(&cfg)?;
    println!("Wrote {}", args.config);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let cfg      = ConfigStore::new(&args.config).load()?;
    let use_case = InspectUseCase::new(cfg);

    let summary = match args.backend {
        BackendKind::Ndarray => use_case.execute::<NdArray>(&Default::default())?,
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(&Default::default())?,
    };
    print_summary(&summary);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let cfg = ConfigStore::new(&args.config).load()?;

    let source: Box<dyn ExampleSource> = match (&args.examples, args.synthetic) {
        (Some(path), _) => Box::new(JsonExampleLoader::new(path)),
        (None, count)   => Box::new(
            SyntheticExamples::new(count.unwrap_or(1), cfg.vocab_size, cfg.num_features)
                .with_seed(args.seed),
        ),
    };

    let use_case    = PredictUseCase::new(cfg, args.top_n, args.batch_size);
    let predictions = match args.backend {
        BackendKind::Ndarray => use_case.execute::<NdArray>(source.as_ref(), Default::default())?,
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(source.as_ref(), Default::default())?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    } else {
        print_predictions(&predictions);
    }
    Ok(())
}

fn print_summary(s: &ReaderSummary) {
    println!("FusionNet reader ({} cells)", s.rnn_type);
    println!("  document input      {:>8}", s.doc_input_dim);
    println!("  question input      {:>8}", s.question_input_dim);
    println!("  low-level hidden    {:>8}", s.low_level_dim);
    println!("  history of word     {:>8}", s.history_dim);
    println!("  self-boosted input  {:>8}", s.self_boosted_dim);
    println!("  final document      {:>8}", s.final_dim);
    println!("  parameters          {:>8}", s.num_params);
}

fn print_predictions(predictions: &[Prediction]) {
    for p in predictions {
        match p.best() {
            None => println!("{}: no span", p.id),
            Some(best) => {
                println!(
                    "{}: [{}, {}] {} tokens, score {:.4}",
                    p.id, best.start, best.end, best.token_count(), best.score
                );
                for span in &p.spans[1..] {
                    println!(
                        "    [{}, {}] {} tokens, score {:.4}",
                        span.start, span.end, span.token_count(), span.score
                    );
                }
            }
        }
    }
}
