use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "lexgraph")]
#[command(about = "Hybrid contract retrieval over a local dataset: semantic search + graph context, RRF fused.")]
pub(crate) struct Cli {
    /// Override config directory (user settings live in `<conf>/lexgraph/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Dataset JSON (graph snapshot + chunks).
    #[arg(long, global = true, default_value = "packages/data/sample_contracts.json")]
    pub(crate) dataset: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub(crate) json: bool,

    /// Debug logging (ignored when RUST_LOG is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum RiskLevelArg {
    High,
    Medium,
    Low,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fused ranking for a query.
    Retrieve {
        /// Natural-language query.
        query: String,

        /// Restrict semantic search to one contract (its graph context is always fetched).
        #[arg(long)]
        contract_id: Option<String>,

        /// Semantic hit cap (default from settings).
        #[arg(long)]
        n_semantic: Option<usize>,

        /// Per-kind graph item cap (default from settings).
        #[arg(long)]
        n_graph: Option<usize>,

        /// Leave out company items.
        #[arg(long)]
        no_companies: bool,

        /// Leave out risk items.
        #[arg(long)]
        no_risks: bool,
    },
    /// Cited context block and sources, as sent to the LLM.
    Context {
        /// Natural-language question.
        query: String,

        /// Restrict semantic search to one contract.
        #[arg(long)]
        contract_id: Option<String>,

        /// Drop lowest-ranked results beyond this token estimate.
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Answer a question with an OpenAI-compatible endpoint (`LEXGRAPH_LLM_URL`).
    Ask {
        /// Natural-language question.
        question: String,

        /// Restrict semantic search to one contract.
        #[arg(long)]
        contract_id: Option<String>,

        /// Drop lowest-ranked results beyond this token estimate.
        #[arg(long)]
        max_context_tokens: Option<usize>,

        /// Completion token cap.
        #[arg(long, default_value_t = 1024)]
        max_answer_tokens: u32,
    },
    /// Graph context of one contract.
    Contract {
        /// Contract id.
        contract_id: String,

        /// Clause cap.
        #[arg(long)]
        max_clauses: Option<usize>,
    },
    /// First clause of a type with the risks that affect it.
    Clause {
        /// Contract id.
        contract_id: String,

        /// Clause category (e.g. `termination`).
        clause_type: String,
    },
    /// Risk factors of one contract with the clause each affects.
    Risks {
        /// Contract id.
        contract_id: String,

        /// Only this severity.
        #[arg(long, value_enum)]
        level: Option<RiskLevelArg>,
    },
    /// Contracts a company is party to, most recent first.
    Similar {
        /// Company name.
        company: String,

        /// Result cap.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}
