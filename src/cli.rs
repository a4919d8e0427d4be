//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data_adapter::{write_ohlcv_csv, CsvDataAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_rules_adapter::JsonRulesAdapter;
use crate::adapters::synthetic_data_adapter::SyntheticDataAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::clause::parse_clause_listing;
use crate::domain::config::{
    build_backtest_config, build_param_ranges, build_params, build_search_config,
};
use crate::domain::engine::{default_trading_rules, evaluate_snapshot, validate_vocabulary};
use crate::domain::error::RuletraderError;
use crate::domain::facts::default_fact_definitions;
use crate::domain::indicators::IndicatorSnapshot;
use crate::domain::metrics::{max_drawdown, sharpe_ratio, total_compounded_return, win_rate};
use crate::domain::rule::HornRule;
use crate::domain::search::beam_search;
use crate::ports::data_port::DataPort;
use crate::ports::rules_port::RulesPort;

#[derive(Parser, Debug)]
#[command(name = "ruletrader", about = "Rule-based trading inference and strategy search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the rule set on one indicator snapshot
    Infer {
        #[arg(long)]
        rsi: f64,
        #[arg(long)]
        macd: f64,
        #[arg(long)]
        ma20: f64,
        #[arg(long)]
        ma50: f64,
        #[arg(long)]
        volume: f64,
        #[arg(long)]
        volatility: Option<f64>,
        #[arg(short, long)]
        rules: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Replay the rule set over a CSV price history
    Backtest {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        rules: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Beam-search threshold parameters against a CSV price history
    Search {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        rules: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the ranked candidates as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a rules file and cross-check its vocabulary
    ValidateRules {
        #[arg(short, long)]
        rules: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Translate a CNF clause listing into a JSON rule set
    TranslateClauses {
        /// Text file with one `RULE_ID: clause [; description]` per line
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a synthetic OHLCV CSV for experimentation
    GenerateData {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 252)]
        days: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Infer {
            rsi,
            macd,
            ma20,
            ma50,
            volume,
            volatility,
            rules,
            config,
        } => {
            let snapshot = IndicatorSnapshot {
                rsi,
                macd,
                ma20,
                ma50,
                volume,
                volatility,
            };
            run_infer(&snapshot, rules.as_ref(), config.as_ref())
        }
        Command::Backtest {
            data,
            rules,
            config,
        } => run_backtest_cmd(&data, rules.as_ref(), config.as_ref()),
        Command::Search {
            data,
            rules,
            config,
            output,
        } => run_search(&data, rules.as_ref(), config.as_ref(), output.as_ref()),
        Command::ValidateRules { rules, config } => run_validate_rules(&rules, config.as_ref()),
        Command::TranslateClauses { input, output } => run_translate_clauses(&input, &output),
        Command::GenerateData { output, days, seed } => run_generate_data(&output, days, seed),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RuletraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn load_rules(path: Option<&PathBuf>) -> Result<Vec<HornRule>, RuletraderError> {
    match path {
        Some(path) => {
            eprintln!("Loading rules from {}", path.display());
            JsonRulesAdapter::new(path.clone()).load_rules()
        }
        None => Ok(default_trading_rules()),
    }
}

fn fail(err: &RuletraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn run_infer(
    snapshot: &IndicatorSnapshot,
    rules_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config and rules
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let params = match build_params(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let facts = default_fact_definitions();

    // Stage 2: Evaluate
    let result = evaluate_snapshot(snapshot, &rules, &facts, &params);

    // Stage 3: Report
    println!("Action: {}", result.action);
    if result.conflict {
        println!("Conflict: BUY and SELL both derived; holding as a fail-safe");
    }
    if result.truncated {
        eprintln!("warning: inference hit the step limit; derivation may be incomplete");
    }
    println!("Fired rules: {}", format_list(&result.fired_rules));
    println!("Derived facts: {}", format_list(&result.derived_facts));
    if !result.chain.is_empty() {
        println!("Derivation:");
        for step in &result.chain {
            let premises: Vec<String> = step
                .supporting_literals
                .iter()
                .map(|lit| {
                    if lit.negated {
                        format!("NOT {}", lit.symbol)
                    } else {
                        lit.symbol.clone()
                    }
                })
                .collect();
            if premises.is_empty() {
                println!("  [{}] => {}", step.rule_id, step.added_fact);
            } else {
                println!(
                    "  [{}] {} => {}",
                    step.rule_id,
                    premises.join(" AND "),
                    step.added_fact
                );
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_backtest_cmd(
    data_path: &PathBuf,
    rules_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config, rules, and data
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let params = match build_params(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let backtest_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!("Loading price history from {}", data_path.display());
    let bars = match CsvDataAdapter::new(data_path.clone()).load_ohlcv() {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    eprintln!("Loaded {} bars", bars.len());

    // Stage 2: Replay
    let facts = default_fact_definitions();
    let outcome = match run_backtest(&bars, &params, &rules, &facts) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    // Stage 3: Report
    let rf = backtest_config.risk_free_rate;
    println!("Bars evaluated: {}", outcome.returns.len());
    println!("Trades:         {}", outcome.num_trades());
    println!("Sharpe:         {:.3}", sharpe_ratio(&outcome.returns, rf));
    println!(
        "Total return:   {:.2}%",
        total_compounded_return(&outcome.returns) * 100.0
    );
    println!(
        "Max drawdown:   {:.2}%",
        max_drawdown(&outcome.returns) * 100.0
    );
    println!("Win rate:       {:.1}%", win_rate(&outcome.returns) * 100.0);
    ExitCode::SUCCESS
}

fn run_search(
    data_path: &PathBuf,
    rules_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config, rules, and data
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let search_config = match build_search_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let ranges = match build_param_ranges(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let rules = match load_rules(rules_path) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!("Loading price history from {}", data_path.display());
    let bars = match CsvDataAdapter::new(data_path.clone()).load_ohlcv() {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    eprintln!(
        "Searching {} parameters, beam width {}, {} iterations",
        ranges.len(),
        search_config.beam_width,
        search_config.iterations
    );

    // Stage 2: Search
    let facts = default_fact_definitions();
    let candidates = match beam_search(&bars, &ranges, &rules, &facts, &search_config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 3: Report
    for (rank, candidate) in candidates.iter().enumerate() {
        println!("#{:<2} {}", rank + 1, candidate.explanation);
        for (name, value) in &candidate.params {
            println!("      {name} = {value:.6}");
        }
    }

    if let Some(path) = output_path {
        let json = match serde_json::to_string_pretty(&candidates) {
            Ok(j) => j,
            Err(e) => {
                return fail(&RuletraderError::Data {
                    reason: format!("candidate serialization error: {e}"),
                });
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            return fail(&e.into());
        }
        eprintln!("Wrote {} candidates to {}", candidates.len(), path.display());
    }
    ExitCode::SUCCESS
}

fn run_validate_rules(rules_path: &PathBuf, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let params = match build_params(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let rules = match JsonRulesAdapter::new(rules_path.clone()).load_rules() {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("Loaded {} rules from {}", rules.len(), rules_path.display());
    for rule in &rules {
        println!(
            "  {} ({} premises) => {}",
            rule.rule_id,
            rule.premises.len(),
            rule.conclusion
        );
    }

    let report = validate_vocabulary(&default_fact_definitions(), &rules, &params);
    if report.is_clean() {
        println!("Vocabulary OK");
    } else {
        for symbol in &report.unknown_symbols {
            println!("warning: premise symbol '{symbol}' is never derivable");
        }
        for key in &report.missing_params {
            println!("warning: parameter '{key}' is referenced but not defined");
        }
    }
    ExitCode::SUCCESS
}

fn run_translate_clauses(input_path: &PathBuf, output_path: &PathBuf) -> ExitCode {
    let content = match std::fs::read_to_string(input_path) {
        Ok(c) => c,
        Err(e) => return fail(&e.into()),
    };
    let rules = match parse_clause_listing(&content) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    if let Err(e) = JsonRulesAdapter::new(output_path.clone()).save_rules(&rules) {
        return fail(&e);
    }
    eprintln!("Wrote {} rules to {}", rules.len(), output_path.display());
    ExitCode::SUCCESS
}

fn run_generate_data(output_path: &PathBuf, days: usize, seed: u64) -> ExitCode {
    let adapter = SyntheticDataAdapter::new(days, seed);
    let bars = match adapter.load_ohlcv() {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    if let Err(e) = write_ohlcv_csv(output_path, &bars) {
        return fail(&e);
    }
    eprintln!("Wrote {} bars to {}", bars.len(), output_path.display());
    ExitCode::SUCCESS
}

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
