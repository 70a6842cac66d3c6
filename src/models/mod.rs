//! Data models for Biblioteca

pub mod book;
pub mod entry;
pub mod loan;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookSummary};
pub use entry::{Entry, EntryDetails};
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use user::{Role, User, UserClaims, UserSummary};
