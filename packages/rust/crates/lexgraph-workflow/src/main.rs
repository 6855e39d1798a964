//! lexgraph CLI: run hybrid retrieval and graph queries over a local dataset.
//!
//! Settings come from `packages/conf/lexgraph.yaml` and the user config home
//! (override with `--conf <dir>`).
//!
//! Logging: set `RUST_LOG=lexgraph=debug` (or `warn`, `info`) to see retrieval logs on stderr.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lexgraph_retrieval::{RetrievalContext, load_retrieval_settings, set_config_home_override};
use lexgraph_workflow::Dataset;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    // Initialize tracing: RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "lexgraph=debug,lexgraph_retrieval=debug,lexgraph_graph=debug,lexgraph_workflow=debug"
        } else {
            "lexgraph=info,lexgraph_retrieval=info,lexgraph_graph=info,lexgraph_workflow=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let settings = load_retrieval_settings();
    let dataset = Dataset::from_path(&cli.dataset)?.load().await?;
    let context = RetrievalContext::from_settings(dataset.vector, dataset.graph, &settings);
    let json = cli.json;

    match cli.command {
        Command::Retrieve {
            query,
            contract_id,
            n_semantic,
            n_graph,
            no_companies,
            no_risks,
        } => {
            commands::run_retrieve(
                &context,
                &query,
                commands::RetrieveArgs {
                    contract_id,
                    n_semantic,
                    n_graph,
                    include_companies: !no_companies,
                    include_risks: !no_risks,
                },
                json,
            )
            .await
        }
        Command::Context {
            query,
            contract_id,
            max_tokens,
        } => commands::run_context(&context, &query, contract_id, max_tokens, json).await,
        Command::Ask {
            question,
            contract_id,
            max_context_tokens,
            max_answer_tokens,
        } => {
            commands::run_ask(
                &context,
                &question,
                contract_id,
                max_context_tokens,
                max_answer_tokens,
                json,
            )
            .await
        }
        Command::Contract {
            contract_id,
            max_clauses,
        } => commands::run_contract(&context, &contract_id, max_clauses, json).await,
        Command::Clause {
            contract_id,
            clause_type,
        } => commands::run_clause(&context, &contract_id, &clause_type, json).await,
        Command::Risks { contract_id, level } => {
            commands::run_risks(&context, &contract_id, level, json).await
        }
        Command::Similar { company, limit } => {
            commands::run_similar(&context, &company, limit, json).await
        }
    }
}
