use tallyup_application::{ExpenseCreationError, LedgerParseError, ProcessingError};
use tallyup_domain::SplitError;

pub fn format_ledger_parse_error(error: &LedgerParseError) -> String {
    match error {
        LedgerParseError::MissingMembersDeclaration => {
            "The ledger must start with a members line, for example `MEMBERS := alice, bob`."
                .to_string()
        }
        LedgerParseError::UndefinedMember { name, line } => {
            format!("'{name}' is not listed in MEMBERS (line {line})")
        }
        LedgerParseError::InvalidAmount { amount, line } => {
            format!("'{amount}' is not a valid amount (line {line})")
        }
        LedgerParseError::SyntaxError { line, detail } => {
            format!("Syntax error - {detail} (line {line})")
        }
    }
}

pub fn format_processing_error(error: &ProcessingError) -> String {
    match error {
        ProcessingError::Expense { line, source } => {
            format!("{} (line {line})", describe_expense_error(source))
        }
        ProcessingError::Ledger(err) => format!("Ledger is inconsistent: {err}"),
        ProcessingError::Settlement(err) => format!("Settlement failed: {err}"),
    }
}

fn describe_expense_error(error: &ExpenseCreationError) -> String {
    match error {
        ExpenseCreationError::InvalidAmount { amount, .. } => {
            format!("{amount} has more decimal places than the currency allows")
        }
        ExpenseCreationError::Split(SplitError::InvalidAmount(_)) => {
            "An expense total must be greater than zero".to_string()
        }
        ExpenseCreationError::Split(err) => err.to_string(),
    }
}
