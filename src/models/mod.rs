pub mod user;
pub mod post;
pub mod engagement;
pub mod social_graph;

pub use engagement::{Comment, CommentView, Like, NewComment, NewLike};
pub use post::{EngagementCounts, NewPost, Post, PostThumbnail, PostView};
pub use social_graph::{Follow, NewFollow};
pub use user::{AuthorSummary, FollowCounts, NewUser, ProfileChanges, User, UserProfile, UserSummary};
