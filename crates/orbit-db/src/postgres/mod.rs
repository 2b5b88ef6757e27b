//! PostgreSQL implementations of the store traits, one module per domain.

mod memberships;
mod spaces;
