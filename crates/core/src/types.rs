/// Primary key of a user record.
pub type UserId = uuid::Uuid;
