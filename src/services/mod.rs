pub mod identity;

pub use identity::{IdentityError, IdentityService, StaffUser};
