pub mod domain;
pub mod service;

pub use domain::{NewUser, User, UserId, UserUpdate};
pub use service::{UserDirectory, UserServiceError};
