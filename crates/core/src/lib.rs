//! Core business logic for Kasira.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `scope` - Tenant scope resolution (organization/branch boundaries)
//! - `procurement` - Purchase order pricing and lifecycle state machine
//! - `audit` - Audit record types and the fire-and-forget sink interface

pub mod audit;
pub mod procurement;
pub mod scope;
