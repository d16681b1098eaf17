pub mod uk;

pub use uk::{Allowance, TaxYear};
