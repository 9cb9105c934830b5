//! Test doubles for the collaborator traits.

pub mod mocks;
