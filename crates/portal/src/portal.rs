//! Portal registry and slot binding.
//!
//! A portal pairs one persistent payload ([`Host`]) with any number of
//! render locations ([`SlotBinding`]). The [`PortalRegistry`] records, per
//! portal id, which node each slot key renders into and which key is active;
//! the host follows the active key around by re-parenting a single container
//! node, so the payload is moved and never rebuilt.

mod activation;
mod create;
mod error;
mod host;
mod instance;
mod slot;
mod store;

pub use activation::{ActivationGuard, ActivationState};
pub use create::{create_portal, Portal, PortalConfig};
pub use error::PortalError;
pub use host::{Host, HostOptions};
pub use instance::PortalInstance;
pub use settings::constants::portal::DEFAULT_PORTAL_ID;
pub use slot::{SlotAttrs, SlotBinding};
pub use store::{PortalRegistry, PortalTransaction};
