//! Domain logic - pure release rules independent of git operations

pub mod channel;
pub mod prerelease;
pub mod tag;

pub use channel::{BranchRule, ChannelResolution, ReleaseChannelPolicy};
pub use prerelease::PrereleaseTag;
pub use tag::TagPattern;
