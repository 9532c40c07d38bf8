//! Batch operations over folders of digitized items.
//!
//! Everything here works on plain folders: scanner output is collated into
//! item folders ([`collate`]), described in a CSV loader ([`loader`]) and
//! packaged for transfer by the [`sip`] pipeline. Decisions that need a
//! human go through an [`Operator`].

pub mod collate;
pub mod disc;
pub mod error;
pub mod legacy;
pub mod loader;
pub mod naming;
pub mod operator;
pub mod sip;
mod util;

pub use crate::operator::{Conflict, Operator, Prompt, Unattended};
