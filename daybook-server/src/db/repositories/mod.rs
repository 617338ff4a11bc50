mod user_repository;
mod post_repository;
mod like_repository;
mod follow_repository;
mod schedule_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use like_repository::LikeRepository;
pub use follow_repository::{FollowRepository, FollowRequest};
pub use schedule_repository::ScheduleRepository;
