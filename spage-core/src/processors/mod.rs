//! Processors that sit outside the database layer.
//!
//! - `EventPublisher`: takes a committed mutation, encodes it and fans it out
//! - `OrganizationDirectory`: resolves an organization id to its display name

pub mod notifier;
pub mod organization_directory;

pub use notifier::{EventPublisher, OrganizationTurn, PublishReport};
pub use organization_directory::{
    DirectoryError, GetOrganizationName, OrganizationDirectory, organization_url,
};
