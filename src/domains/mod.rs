//! Domains module containing business logic organized by bounded contexts.
//!
//! The server has a single domain: the catalog of OData query tools and the
//! dispatcher that runs them.

pub mod tools;
