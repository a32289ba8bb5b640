pub mod status;
pub mod user;

pub use status::{NewStatus, Status, StatusFilter, StatusPatch, StatusResponse, StatusState};
pub use user::{NewUser, User, UserPatch, UserResponse};
