//! End-to-End Integration Tests
//!
//! These tests drive the multi-tenant SAML strategy through scripted
//! resolvers and a recording protocol engine.

mod construction;
mod metadata;
mod replay;
