/// Net position of one person in integer minor units
/// (positive: is owed money, negative: owes money).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonBalance<MemberId = u64> {
    pub id: MemberId,
    pub balance: i64,
}

/// `from` pays `amount` minor units to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment<MemberId = u64> {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: i64,
}
