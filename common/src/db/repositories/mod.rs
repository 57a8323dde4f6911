// Repository layer for database operations

pub mod application;
pub mod job;
pub mod profile;
pub mod saved_job;

pub use application::ApplicationRepository;
pub use job::JobRepository;
pub use profile::ProfileRepository;
pub use saved_job::SavedJobRepository;
