pub mod classify;
pub mod deposits;
pub mod review;

pub use classify::{is_contribution_source, is_isa_account, isa_kind, IsaKind, SourcePolicy};
pub use deposits::{account_deposits, extract_deposits, isa_accounts, Deposit};
pub use review::{review, Usage, YearReview};
