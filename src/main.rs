//! # scalar-gpt
//!
//! Trains a small GPT on a line-per-document corpus, writes a checkpoint, and prints
//! samples. Every setting comes from `SCALAR_GPT_*` environment variables (see
//! `scalar_gpt_core::config`); log verbosity follows `RUST_LOG` (default `info`).

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scalar_gpt_core::checkpoint::Checkpoint;
use scalar_gpt_core::config::{self, Config};
use scalar_gpt_core::data::load_from_path;
use scalar_gpt_core::model::Gpt;
use scalar_gpt_core::nn::Module;
use scalar_gpt_core::sample::generate;
use scalar_gpt_core::tokenizer::{CharTokenizer, Tokenizer};
use scalar_gpt_core::train::Trainer;
use scalar_gpt_core::Error;

const BOS_SYMBOL: &str = "<BOS>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run().map_err(|e| {
        error!(error = %e, "run failed");
        e.into()
    })
}

fn run() -> Result<(), Error> {
    let cfg = config::from_env()?;
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    // ----- Dataset: one document per line, shuffled -----
    let mut data = load_from_path(&cfg.input_path)?;
    data.shuffle(&mut rng);
    info!(path = %cfg.input_path.display(), documents = data.len(), "corpus loaded");

    // ----- Tokenizer: BOS + sorted unique characters -----
    let tokenizer = CharTokenizer::from_corpus(&data.corpus(), BOS_SYMBOL);
    let documents = data
        .lines()
        .into_iter()
        .map(|doc| tokenizer.encode_document(doc))
        .collect::<Result<Vec<_>, _>>()?;
    info!(vocab_size = tokenizer.vocab_size(), "tokenizer built");

    // ----- Model and training -----
    let model = Gpt::new(cfg.model_config(tokenizer.vocab_size()), &mut rng)?;
    info!(num_params = model.num_parameters(), "model initialized");
    let history = train(&cfg, &model, &documents)?;
    if let Some(last) = history.last() {
        info!(final_loss = last, "training finished");
    }

    Checkpoint::capture(&model).save(&cfg.checkpoint_path)?;

    // ----- Inference -----
    println!("\n--- samples ---");
    for i in 0..cfg.sample_size {
        let ids = generate(&model, tokenizer.bos_id(), cfg.block_size, cfg.temperature, &mut rng)?;
        println!("sample {:2}: {}", i + 1, tokenizer.decode(&ids)?);
    }
    Ok(())
}

fn train(cfg: &Config, model: &Gpt, documents: &[Vec<usize>]) -> Result<Vec<f64>, Error> {
    let mut trainer = Trainer::from_config(cfg);
    let history = trainer.run(model, documents)?;
    Ok(history.into_iter().map(|s| s.loss).collect())
}
