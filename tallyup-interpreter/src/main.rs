#![warn(clippy::uninlined_format_args)]

use std::{borrow::Cow, env, fs, process};

use tallyup_application::{
    Command, EngineConfig, Ledger, LedgerProcessor, LedgerStatement, SettlementResult,
};
use tallyup_infrastructure::{GreedySettlementOptimizer, TallyupLedgerParser};
use tallyup_presentation::{
    SettlementPresenter, format_ledger_parse_error, format_processing_error,
};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let Some(path) = env::args().nth(1) else {
        return Err("Usage: tallyup_interpreter <file.tally>".into());
    };

    let config = EngineConfig::from_env().map_err(|err| format!("Invalid configuration: {err}"))?;
    let source =
        fs::read_to_string(&path).map_err(|err| format!("Failed to read '{path}': {err}"))?;

    let processor = LedgerProcessor::new(&TallyupLedgerParser, &GreedySettlementOptimizer, config);
    let ledger = processor
        .parse_ledger(&source)
        .map_err(|err| format_ledger_parse_error(&err))?;
    tracing::info!(
        path = %path,
        member_count = ledger.members().len(),
        statement_count = ledger.statements().len(),
        "Ledger loaded"
    );

    print_ledger_output(&processor, &ledger)
}

fn print_ledger_output(processor: &LedgerProcessor<'_>, ledger: &Ledger) -> CliResult<()> {
    let currency = processor.config().currency;

    if !ledger.has_commands() {
        let result = processor
            .build_settlement_result(ledger)
            .map_err(|err| format_processing_error(&err))?;
        print_settlement(&result, processor);
        return Ok(());
    }

    for (index, stmt) in ledger.statements().iter().enumerate() {
        let LedgerStatement::Command(command) = &stmt.statement else {
            continue;
        };
        let result = processor
            .build_settlement_result_for_prefix(ledger, index)
            .map_err(|err| format_processing_error(&err))?;

        match command {
            Command::Balances => {
                println!("# Balances (line {})", stmt.line);
                print!(
                    "{}",
                    SettlementPresenter::build_balance_table(&result.balances, currency)
                );
                println!();
            }
            Command::Settle => {
                println!("# Settlement (line {})", stmt.line);
                print_settlement(&result, processor);
            }
            Command::SettleUp(members) => {
                let names: Vec<&str> = members.iter().map(|member| member.as_str()).collect();
                println!("# Settle up {} (line {})", names.join(", "), stmt.line);
                print_settlement(&result, processor);
            }
        }
    }

    Ok(())
}

fn print_settlement(result: &SettlementResult, processor: &LedgerProcessor<'_>) {
    let view = SettlementPresenter::render(result, processor.config().currency);
    print!("{}", view.balance_table);
    println!();
    match view.transfer_table {
        Some(table) => {
            print!("{table}");
            println!();
        }
        None => println!("Everyone is settled.\n"),
    }
}
