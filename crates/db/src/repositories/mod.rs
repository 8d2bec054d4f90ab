//! Repository abstractions for data access.
//!
//! Each repository wraps a `DatabaseConnection` and owns the
//! persistence side of one aggregate. Pure business rules live in
//! `twungurane-core`; repositories resolve the facts those rules need
//! inside their own transactions and translate rule violations into
//! repository errors.

pub mod contribution;
pub mod group;
pub mod ledger;
pub mod loan;
pub mod member;
pub mod user;

pub use contribution::ContributionRepository;
pub use group::GroupRepository;
pub use ledger::LedgerRepository;
pub use loan::LoanRepository;
pub use member::MemberRepository;
pub use user::UserRepository;
