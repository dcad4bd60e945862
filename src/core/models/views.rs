//! Joined read rows returned by the store. Each row is assembled inside a
//! single store snapshot, mirroring the relational JOINs a SQL-backed store
//! would perform.

use serde::{Deserialize, Serialize};

use super::account::Account;
use super::debt::Debt;
use super::expense::{ExpenseShare, GroupExpense};
use super::group::{ExpenseGroup, GroupMember};

/// A debt together with both party accounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebtWithParties {
    pub debt: Debt,
    pub creditor: Account,
    pub debtor: Account,
}

/// A member row joined with the member's account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberProfile {
    pub member: GroupMember,
    pub account: Account,
}

/// A member row joined with its group and the member's account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipRow {
    pub group: ExpenseGroup,
    pub member: GroupMember,
    pub account: Account,
}

/// A group with its member roster and aggregate payment statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupDetails {
    pub group: ExpenseGroup,
    pub members: Vec<MemberProfile>,
    pub stats: super::reports::GroupStats,
}

/// An expense share joined with the owing account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareProfile {
    pub share: ExpenseShare,
    pub account: Account,
}

/// An expense with its full share set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseWithShares {
    pub expense: GroupExpense,
    pub shares: Vec<ShareProfile>,
}
