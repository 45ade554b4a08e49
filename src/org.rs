//! Organization-domain identifiers, references, and membership models.

pub mod id;
pub mod membership;
pub mod reference;

pub use id::*;
pub use membership::*;
pub use reference::*;
