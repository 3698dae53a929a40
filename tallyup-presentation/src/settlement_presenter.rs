use crate::text_table::{Alignment, TextTableBuilder};
use fxhash::FxHashSet;
use std::borrow::Cow;
use tallyup_application::{PersonBalance, SettlementResult};
use tallyup_domain::{CurrencyContext, Money, Transfer};

const MEMBER: &str = "Member";
const BALANCE: &str = "Balance";
const FROM: &str = "From";
const TO: &str = "To";
const AMOUNT: &str = "Amount";
const CATEGORY: &str = "Category";
const SETTLEMENT_PAYMENT: &str = "Settlement payment";
const PAYMENT_TO_SETTLOR: &str = "Payment to settlor";
const PENDING: &str = "Pending";

pub struct SettlementPresenter;

pub struct SettlementView {
    pub balance_table: String,
    pub transfer_table: Option<String>,
}

impl SettlementPresenter {
    pub fn render(result: &SettlementResult, currency: CurrencyContext) -> SettlementView {
        let balance_table = Self::build_balance_table(&result.balances, currency);

        if let Some(settle_up) = &result.settle_up {
            let has_any_transfers =
                !settle_up.immediate_transfers.is_empty() || !result.optimized_transfers.is_empty();
            if !has_any_transfers {
                return SettlementView {
                    balance_table,
                    transfer_table: None,
                };
            }

            let settle_member_lookup: FxHashSet<_> = settle_up.settle_members.iter().collect();

            let mut pay_from_settle: Vec<&Transfer> = Vec::new();
            let mut receive_for_settle: Vec<&Transfer> = Vec::new();
            let mut other_settlements: Vec<&Transfer> = Vec::new();

            for transfer in settle_up
                .immediate_transfers
                .iter()
                .chain(result.optimized_transfers.iter())
            {
                if settle_member_lookup.contains(&transfer.from) {
                    pay_from_settle.push(transfer);
                } else if settle_member_lookup.contains(&transfer.to) {
                    receive_for_settle.push(transfer);
                } else {
                    other_settlements.push(transfer);
                }
            }

            sort_transfers(&mut pay_from_settle);
            sort_transfers(&mut receive_for_settle);
            sort_transfers(&mut other_settlements);

            let transfer_table = Self::build_settle_up_transfer_table(
                &pay_from_settle,
                &receive_for_settle,
                &other_settlements,
                currency,
            );
            return SettlementView {
                balance_table,
                transfer_table: Some(transfer_table),
            };
        }

        let transfer_table = (!result.optimized_transfers.is_empty())
            .then(|| Self::build_transfer_table(&result.optimized_transfers, currency));
        SettlementView {
            balance_table,
            transfer_table,
        }
    }

    pub fn build_balance_table(
        person_balances: &[PersonBalance],
        currency: CurrencyContext,
    ) -> String {
        let headers = [Cow::Borrowed(MEMBER), Cow::Borrowed(BALANCE)];
        TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right])
            .headers(&headers)
            .rows(person_balances.iter().map(|person| {
                [
                    Cow::Borrowed(person.id.as_str()),
                    Cow::Owned(format_balance(person.balance, currency)),
                ]
            }))
            .build()
    }

    pub fn build_transfer_table(transfers: &[Transfer], currency: CurrencyContext) -> String {
        let headers = [Cow::Borrowed(FROM), Cow::Borrowed(TO), Cow::Borrowed(AMOUNT)];
        TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&headers)
            .rows(transfers.iter().map(|transfer| {
                [
                    Cow::Borrowed(transfer.from.as_str()),
                    Cow::Borrowed(transfer.to.as_str()),
                    Cow::Owned(currency.format(transfer.amount)),
                ]
            }))
            .build()
    }

    pub fn build_settle_up_transfer_table(
        pay_from_settle: &[&Transfer],
        receive_for_settle: &[&Transfer],
        other_settlements: &[&Transfer],
        currency: CurrencyContext,
    ) -> String {
        let headers = [
            Cow::Borrowed(CATEGORY),
            Cow::Borrowed(FROM),
            Cow::Borrowed(TO),
            Cow::Borrowed(AMOUNT),
        ];
        let categorized = pay_from_settle
            .iter()
            .map(|transfer| (SETTLEMENT_PAYMENT, *transfer))
            .chain(
                receive_for_settle
                    .iter()
                    .map(|transfer| (PAYMENT_TO_SETTLOR, *transfer)),
            )
            .chain(other_settlements.iter().map(|transfer| (PENDING, *transfer)));

        TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Left,
                Alignment::Left,
                Alignment::Right,
            ])
            .headers(&headers)
            .rows(categorized.map(|(category, transfer)| {
                [
                    Cow::Borrowed(category),
                    Cow::Borrowed(transfer.from.as_str()),
                    Cow::Borrowed(transfer.to.as_str()),
                    Cow::Owned(currency.format(transfer.amount)),
                ]
            }))
            .build()
    }
}

fn format_balance(balance: Money, currency: CurrencyContext) -> String {
    let sign = if balance.is_negative() { "" } else { "+" };
    format!("{sign}{}", currency.format(balance))
}

fn sort_transfers(transfers: &mut [&Transfer]) {
    transfers.sort_unstable_by(|lhs, rhs| {
        lhs.from
            .cmp(&rhs.from)
            .then_with(|| lhs.to.cmp(&rhs.to))
            .then_with(|| lhs.amount.cmp(&rhs.amount))
    });
}
