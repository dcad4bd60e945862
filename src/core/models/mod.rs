pub mod account;
pub mod debt;
pub mod expense;
pub mod group;
pub mod reports;
pub mod views;

pub use account::Account;
pub use debt::{Debt, DebtConfirmStatus, PaidStatus, PaymentConfirmStatus};
pub use expense::{ExpenseShare, GroupExpense, ShareInput};
pub use group::{ExpenseGroup, GroupMember, JoinStatus, MemberPaymentStatus, OwnerConfirmStatus};
