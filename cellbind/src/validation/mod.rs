//! Validation failures and their localized messages.
//!
//! # Flow
//!
//! ```text
//! stage fails ──► ValidationFailure (key, variables, rejected value)
//!                        │
//!      chain executor ───┤ attaches CellContext (line, row, column, label)
//!                        ▼
//!                 MessageResolver ──► MessageStore layers
//!                        │            (ja_JP_JP → ja_JP → ja → root)
//!                        ▼
//!                 ResolvedMessage
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cellbind::validation::MessageResolver;
//! use cellbind::locale::Locale;
//!
//! let resolver = MessageResolver::default().with_locale(Locale::parse("ja").unwrap());
//! for message in resolver.resolve_all(&outcome.failures) {
//!     println!("{}", message.message);
//! }
//! ```

pub mod failure;
pub mod messages;
pub mod resolver;

pub use failure::{
    CellContext, FailureKind, MessageArg, MessageSource, MessageVariables, RejectedValue,
    ValidationFailure,
};
pub use messages::{MessageBundle, MessageStore, FALLBACK_KEY};
pub use resolver::{MessageResolver, ResolvedMessage};
