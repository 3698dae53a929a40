use fxhash::FxHashSet;
use rust_decimal::Decimal;
use std::str::FromStr;
use tallyup_application::{
    Command, ExpenseInput, Ledger, LedgerParseError, LedgerParser, LedgerStatement,
    LedgerStatementWithLine, SplitInput,
};
use tallyup_domain::{ExpenseId, ParticipantId};
use tallyup_parser::{
    Command as ParserCommand, Expense as ParserExpense, ParseError, Participants,
    SplitClause, Statement as ParserStatement, parse_program,
};

#[derive(Default)]
pub struct TallyupLedgerParser;

/// Members declared so far, with name lookups resolved against them.
struct MemberTable {
    members: Vec<ParticipantId>,
    names: FxHashSet<ParticipantId>,
}

impl MemberTable {
    fn new(names: &[&str]) -> Self {
        let mut members = Vec::with_capacity(names.len());
        let mut seen = FxHashSet::default();
        for name in names {
            let id = ParticipantId::from(*name);
            if seen.insert(id.clone()) {
                members.push(id);
            }
        }
        Self {
            members,
            names: seen,
        }
    }

    fn resolve(&self, name: &str, line: usize) -> Result<ParticipantId, LedgerParseError> {
        self.names
            .get(name)
            .cloned()
            .ok_or_else(|| LedgerParseError::UndefinedMember {
                name: name.to_string(),
                line,
            })
    }

    fn resolve_all(
        &self,
        participants: &Participants<'_>,
        line: usize,
    ) -> Result<Vec<ParticipantId>, LedgerParseError> {
        match participants {
            Participants::Everyone => Ok(self.members.clone()),
            Participants::Names(names) => names
                .iter()
                .map(|name| self.resolve(name, line))
                .collect(),
        }
    }
}

impl LedgerParser for TallyupLedgerParser {
    fn parse(&self, content: &str) -> Result<Ledger, LedgerParseError> {
        let program = parse_program(content).map_err(map_parse_error)?;

        let mut table: Option<MemberTable> = None;
        let mut statements = Vec::with_capacity(program.statements.len());

        for stmt in program.statements {
            let line = stmt.line;
            let statement = match stmt.statement {
                ParserStatement::Members(names) => {
                    if table.is_some() {
                        return Err(LedgerParseError::SyntaxError {
                            line,
                            detail: "MEMBERS is declared more than once".to_string(),
                        });
                    }
                    table = Some(MemberTable::new(&names));
                    continue;
                }
                ParserStatement::Expense(expense) => LedgerStatement::Expense(to_expense_input(
                    declared(&table)?,
                    &expense,
                    line,
                )?),
                ParserStatement::Command(ParserCommand::Balances) => {
                    declared(&table)?;
                    LedgerStatement::Command(Command::Balances)
                }
                ParserStatement::Command(ParserCommand::Settle) => {
                    declared(&table)?;
                    LedgerStatement::Command(Command::Settle)
                }
                ParserStatement::Command(ParserCommand::SettleUp(participants)) => {
                    LedgerStatement::Command(Command::SettleUp(
                        declared(&table)?.resolve_all(&participants, line)?,
                    ))
                }
            };
            statements.push(LedgerStatementWithLine { line, statement });
        }

        let table = table.ok_or(LedgerParseError::MissingMembersDeclaration)?;
        tracing::debug!(
            member_count = table.members.len(),
            statement_count = statements.len(),
            "Ledger parsed"
        );
        Ok(Ledger::new(table.members, statements))
    }
}

fn declared(table: &Option<MemberTable>) -> Result<&MemberTable, LedgerParseError> {
    table
        .as_ref()
        .ok_or(LedgerParseError::MissingMembersDeclaration)
}

fn to_expense_input(
    members: &MemberTable,
    expense: &ParserExpense<'_>,
    line: usize,
) -> Result<ExpenseInput, LedgerParseError> {
    let payer = members.resolve(expense.payer, line)?;
    let total = parse_amount(expense.amount, line)?;
    let split = match &expense.split {
        SplitClause::Equal(participants) => {
            SplitInput::Equal(members.resolve_all(participants, line)?)
        }
        SplitClause::Custom(entries) => SplitInput::Custom(
            entries
                .iter()
                .map(|entry| {
                    Ok((
                        members.resolve(entry.name, line)?,
                        parse_amount(entry.amount, line)?,
                    ))
                })
                .collect::<Result<Vec<_>, LedgerParseError>>()?,
        ),
    };

    Ok(ExpenseInput {
        id: ExpenseId::new(format!("{}#{line}", expense.label)),
        payer,
        total,
        split,
    })
}

fn parse_amount(amount: &str, line: usize) -> Result<Decimal, LedgerParseError> {
    Decimal::from_str(amount).map_err(|_| LedgerParseError::InvalidAmount {
        amount: amount.to_string(),
        line,
    })
}

fn map_parse_error(err: ParseError) -> LedgerParseError {
    match err {
        ParseError::SyntaxError { line, detail } => LedgerParseError::SyntaxError { line, detail },
    }
}
