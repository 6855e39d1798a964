use std::sync::Arc;

use anyhow::Result;
use lexgraph_graph::{ContextOptions, GraphContext, RiskLevel};
use lexgraph_retrieval::{HybridRetrievalResponse, RetrievalContext, RetrieveOptions, Retriever};
use lexgraph_workflow::{
    AnswerOptions, ChatCompletionClient, GraphRagWorkflow, LlmClientConfig, extract_sources,
    format_context, truncate_to_token_budget,
};
use serde::Serialize;

use crate::cli::RiskLevelArg;

const CONTENT_COLUMN_CHARS: usize = 72;

pub(crate) struct RetrieveArgs {
    pub(crate) contract_id: Option<String>,
    pub(crate) n_semantic: Option<usize>,
    pub(crate) n_graph: Option<usize>,
    pub(crate) include_companies: bool,
    pub(crate) include_risks: bool,
}

fn base_options(context: &RetrievalContext, contract_id: Option<String>) -> RetrieveOptions {
    let mut options = context.hybrid_retriever().default_options();
    options.contract_id = contract_id;
    options
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn one_line(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}

fn print_ranking(response: &HybridRetrievalResponse) {
    println!(
        "{} results (semantic {}, graph {}, ~{} tokens)",
        response.results.len(),
        response.semantic_count,
        response.graph_count,
        response.total_tokens_estimate
    );
    for (rank, result) in response.results.iter().enumerate() {
        println!(
            "{:>3}  {:.5}  {:<8}  {:<8}  {:<12}  {}",
            rank + 1,
            result.rrf_score(),
            result.source.to_string(),
            result.item_type().unwrap_or("chunk"),
            result.contract_id,
            one_line(&result.content, CONTENT_COLUMN_CHARS)
        );
    }
}

pub(crate) async fn run_retrieve(
    context: &RetrievalContext,
    query: &str,
    args: RetrieveArgs,
    json: bool,
) -> Result<()> {
    let mut options = base_options(context, args.contract_id);
    if let Some(n) = args.n_semantic {
        options.n_semantic = n;
    }
    if let Some(n) = args.n_graph {
        options.n_graph = n;
    }
    options.include_companies = args.include_companies;
    options.include_risks = args.include_risks;

    let response = context.retriever().retrieve(query, &options).await?;
    if json {
        return print_json(&response);
    }
    print_ranking(&response);
    Ok(())
}

#[derive(Serialize)]
struct ContextOutput {
    context: String,
    sources: Vec<lexgraph_workflow::Source>,
    tokens: usize,
}

pub(crate) async fn run_context(
    context: &RetrievalContext,
    query: &str,
    contract_id: Option<String>,
    max_tokens: Option<usize>,
    json: bool,
) -> Result<()> {
    let options = base_options(context, contract_id);
    let response = context.retriever().retrieve(query, &options).await?;
    let results = match max_tokens {
        Some(budget) => truncate_to_token_budget(response.results, budget),
        None => response.results,
    };
    let output = ContextOutput {
        context: format_context(&results),
        sources: extract_sources(&results),
        tokens: lexgraph_retrieval::estimate_tokens(&results),
    };
    if json {
        return print_json(&output);
    }
    println!("{}\n", output.context);
    println!("Sources (~{} tokens):", output.tokens);
    for source in &output.sources {
        println!(
            "  [{}] {} {} score={:.5} {}",
            source.index,
            source.source_type,
            source.contract_id,
            source.score,
            source.preview
        );
    }
    Ok(())
}

pub(crate) async fn run_ask(
    context: &RetrievalContext,
    question: &str,
    contract_id: Option<String>,
    max_context_tokens: Option<usize>,
    max_answer_tokens: u32,
    json: bool,
) -> Result<()> {
    let llm = ChatCompletionClient::new(LlmClientConfig::from_env());
    let workflow = GraphRagWorkflow::new(context.retriever(), Arc::new(llm));
    let options = AnswerOptions {
        retrieve: base_options(context, contract_id),
        max_context_tokens,
        max_answer_tokens,
    };
    let answer = workflow.answer(question, &options).await?;
    if json {
        return print_json(&answer);
    }
    println!("{}\n", answer.answer);
    for source in &answer.sources {
        println!(
            "  [{}] {} {} {}",
            source.index, source.source_type, source.contract_id, source.preview
        );
    }
    if !answer.model_name.is_empty() {
        println!(
            "\nmodel={} complexity={} tokens={}+{} cost=${:.6}",
            answer.model_name,
            answer.complexity,
            answer.input_tokens,
            answer.output_tokens,
            answer.cost
        );
    }
    Ok(())
}

fn print_graph_context(graph: &GraphContext) {
    println!("Contract {}", graph.contract_id);
    for (key, value) in &graph.contract_metadata {
        println!("  {key}: {value}");
    }
    if !graph.companies.is_empty() {
        println!("Parties:");
        for company in &graph.companies {
            println!("  {} ({})", company.name, company.role);
        }
    }
    if !graph.related_clauses.is_empty() {
        println!("Clauses:");
        for clause in &graph.related_clauses {
            println!(
                "  {} [{}] {}",
                clause.section_name,
                clause.clause_type,
                one_line(&clause.content, CONTENT_COLUMN_CHARS)
            );
        }
    }
    if !graph.risk_factors.is_empty() {
        println!("Risks:");
        for risk in &graph.risk_factors {
            println!("  ({}) {} - {}", risk.risk_level, risk.concern, risk.description);
        }
    }
}

pub(crate) async fn run_contract(
    context: &RetrievalContext,
    contract_id: &str,
    max_clauses: Option<usize>,
    json: bool,
) -> Result<()> {
    let options = ContextOptions {
        max_clauses: max_clauses.unwrap_or(context.config().max_clauses),
        ..ContextOptions::default()
    };
    let graph = context
        .graph_retriever()
        .get_context_for_contract(contract_id, &options)
        .await?;
    if json {
        return print_json(&graph);
    }
    match graph {
        Some(graph) => print_graph_context(&graph),
        None => println!("Contract {contract_id} not found"),
    }
    Ok(())
}

pub(crate) async fn run_clause(
    context: &RetrievalContext,
    contract_id: &str,
    clause_type: &str,
    json: bool,
) -> Result<()> {
    let found = context
        .graph_retriever()
        .get_context_for_clause_type(contract_id, clause_type)
        .await?;
    if json {
        return print_json(&found);
    }
    let Some(found) = found else {
        println!("No {clause_type} clause in contract {contract_id}");
        return Ok(());
    };
    println!("{} [{}]", found.clause.section_name, found.clause.clause_type);
    println!("{}", found.clause.content);
    for risk in &found.related_risks {
        println!("  ({}) {} - {}", risk.risk_level, risk.concern, risk.description);
    }
    Ok(())
}

pub(crate) async fn run_risks(
    context: &RetrievalContext,
    contract_id: &str,
    level: Option<RiskLevelArg>,
    json: bool,
) -> Result<()> {
    let level = level.map(|l| match l {
        RiskLevelArg::High => RiskLevel::High,
        RiskLevelArg::Medium => RiskLevel::Medium,
        RiskLevelArg::Low => RiskLevel::Low,
    });
    let risks = context
        .graph_retriever()
        .get_risk_context(contract_id, level)
        .await?;
    if json {
        return print_json(&risks);
    }
    if risks.is_empty() {
        println!("No risk factors for contract {contract_id}");
    }
    for entry in &risks {
        println!(
            "({}) {} - {}",
            entry.risk.risk_level, entry.risk.concern, entry.risk.description
        );
        if let Some(clause) = &entry.clause_content {
            println!("    affects: {}", one_line(clause, CONTENT_COLUMN_CHARS));
        }
    }
    Ok(())
}

pub(crate) async fn run_similar(
    context: &RetrievalContext,
    company: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let contracts = context
        .graph_retriever()
        .find_similar_contracts_by_company(company, limit)
        .await?;
    if json {
        return print_json(&contracts);
    }
    if contracts.is_empty() {
        println!("No contracts for {company}");
    }
    for contract in &contracts {
        println!(
            "{:<12}  {:<28}  {:<8}  {}",
            contract.contract_id, contract.filename, contract.role, contract.risk_level
        );
    }
    Ok(())
}
