#![warn(clippy::uninlined_format_args)]

//! Line-oriented grammar of the ledger text format.
//!
//! ```text
//! MEMBERS := alice, bob, carol
//! dinner: alice paid 90.00 for alice, bob, carol   // equal split
//! taxi: bob paid 30 for alice = 10, carol = 20.00  /* custom split */
//! refund: carol paid 5 for MEMBERS
//! BALANCES
//! SETTLE
//! SETTLE UP alice, bob
//! ```
//!
//! Names and amounts are kept as source slices; resolving members and
//! converting amounts is left to the caller.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_until, take_while1},
    character::complete::{char, digit1, multispace1},
    combinator::{not, opt, peek, recognize},
    multi::{many0, separated_list1},
    sequence::delimited,
};
use smallvec::SmallVec;

/// Keyword that stands for every declared member.
pub const MEMBERS_KEYWORD: &str = "MEMBERS";

pub type NameList<'a> = SmallVec<[&'a str; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub enum Participants<'a> {
    Everyone,
    Names(NameList<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitEntry<'a> {
    pub name: &'a str,
    pub amount: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitClause<'a> {
    Equal(Participants<'a>),
    Custom(SmallVec<[SplitEntry<'a>; 4]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense<'a> {
    pub label: &'a str,
    pub payer: &'a str,
    pub amount: &'a str,
    pub split: SplitClause<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    Balances,
    Settle,
    SettleUp(Participants<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    Members(NameList<'a>),
    Expense(Expense<'a>),
    Command(Command<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementWithLine<'a> {
    pub line: usize,
    pub statement: Statement<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program<'a> {
    pub statements: Vec<StatementWithLine<'a>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at line {line}: {detail}")]
    SyntaxError { line: usize, detail: String },
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-').parse(input)
}

fn sp(input: &str) -> IResult<&str, &str> {
    fn comment(input: &str) -> IResult<&str, &str> {
        delimited(tag("/*"), take_until("*/"), tag("*/")).parse(input)
    }

    fn line_comment(input: &str) -> IResult<&str, &str> {
        recognize((tag("//"), take_till(|c| c == '\n'))).parse(input)
    }

    recognize(many0(alt((multispace1, comment, line_comment)))).parse(input)
}

// 90, 90.5, -3.25
fn amount(input: &str) -> IResult<&str, &str> {
    recognize((opt(char('-')), digit1, opt((char('.'), digit1)))).parse(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    delimited(sp, char(','), sp).parse(input)
}

fn name_list(input: &str) -> IResult<&str, NameList<'_>> {
    separated_list1(comma, identifier)
        .map(SmallVec::from_vec)
        .parse(input)
}

fn participants(input: &str) -> IResult<&str, Participants<'_>> {
    name_list
        .map(|names| {
            if names.as_slice() == [MEMBERS_KEYWORD] {
                Participants::Everyone
            } else {
                Participants::Names(names)
            }
        })
        .parse(input)
}

fn split_entry(input: &str) -> IResult<&str, SplitEntry<'_>> {
    (identifier, sp, char('='), sp, amount)
        .map(|(name, _, _, _, amount)| SplitEntry { name, amount })
        .parse(input)
}

fn split_clause(input: &str) -> IResult<&str, SplitClause<'_>> {
    alt((
        separated_list1(comma, split_entry)
            .map(|entries| SplitClause::Custom(SmallVec::from_vec(entries))),
        participants.map(SplitClause::Equal),
    ))
    .parse(input)
}

// MEMBERS := alice, bob
fn members_declaration(input: &str) -> IResult<&str, NameList<'_>> {
    (tag(MEMBERS_KEYWORD), sp, tag(":="), sp, name_list)
        .map(|(_, _, _, _, names)| names)
        .parse(input)
}

// {label}: {payer} paid {amount} for {split}
fn expense(input: &str) -> IResult<&str, Expense<'_>> {
    (
        identifier, // label
        sp,
        char(':'),
        sp,
        identifier, // payer
        sp,
        tag_no_case("paid"),
        sp,
        amount,
        sp,
        tag_no_case("for"),
        sp,
        split_clause,
    )
        .map(
            |(label, _, _, _, payer, _, _, _, amount, _, _, _, split)| Expense {
                label,
                payer,
                amount,
                split,
            },
        )
        .parse(input)
}

fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    // "SETTLEMENT" must not match "SETTLE"
    (tag_no_case(word), peek(not(identifier))).map(|(matched, _)| matched)
}

fn command(input: &str) -> IResult<&str, Command<'_>> {
    alt((
        keyword("balances").map(|_| Command::Balances),
        (keyword("settle"), sp, keyword("up"), sp, participants)
            .map(|(_, _, _, _, members)| Command::SettleUp(members)),
        keyword("settle").map(|_| Command::Settle),
    ))
    .parse(input)
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
    alt((
        members_declaration.map(Statement::Members),
        expense.map(Statement::Expense),
        command.map(Statement::Command),
    ))
    .parse(input)
}

fn statement_with_sp(input: &str) -> IResult<&str, Statement<'_>> {
    (sp, statement, sp).map(|(_, stmt, _)| stmt).parse(input)
}

fn syntax_error_detail(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(err) | nom::Err::Failure(err) => {
            let near: String = err.input.chars().take(24).collect();
            if near.is_empty() {
                "unexpected end of line".to_string()
            } else {
                format!("unexpected input near '{near}'")
            }
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    }
}

/// Parses a whole ledger, one statement per line. Line numbers are 1-based.
pub fn parse_program(input: &str) -> Result<Program<'_>, ParseError> {
    let mut statements = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let (rest, _) = sp(line).map_err(|e| ParseError::SyntaxError {
            line: idx + 1,
            detail: syntax_error_detail(e),
        })?;
        if rest.trim().is_empty() {
            continue;
        }
        match statement_with_sp(rest) {
            Ok((rest, stmt)) => {
                if !rest.trim().is_empty() {
                    return Err(ParseError::SyntaxError {
                        line: idx + 1,
                        detail: format!("unparsed input '{}'", rest.trim()),
                    });
                }
                statements.push(StatementWithLine {
                    line: idx + 1,
                    statement: stmt,
                });
            }
            Err(e) => {
                return Err(ParseError::SyntaxError {
                    line: idx + 1,
                    detail: syntax_error_detail(e),
                });
            }
        }
    }

    Ok(Program { statements })
}
