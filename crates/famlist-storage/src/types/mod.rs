//! Entity types shared by all storage backends.

mod families;
mod ids;
mod invitations;
mod notifications;
mod roles;

pub use families::*;
pub use ids::*;
pub use invitations::*;
pub use notifications::*;
pub use roles::*;
