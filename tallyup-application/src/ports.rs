use crate::{
    error::{LedgerParseError, SettlementOptimizationError},
    model::Ledger,
};
use tallyup_domain::{MemberBalances, ParticipantId, Settlement, Transfer};

pub trait LedgerParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<Ledger, LedgerParseError>;
}

pub trait SettlementOptimizer: Send + Sync {
    fn optimize(&self, balances: &MemberBalances)
    -> Result<Vec<Transfer>, SettlementOptimizationError>;

    fn settle_up(
        &self,
        balances: MemberBalances,
        settle_members: &[ParticipantId],
    ) -> Result<Settlement, SettlementOptimizationError>;
}
