mod category;
mod event;
mod event_old_slug;
mod event_participant;
mod event_tag;
mod group;
mod location;
mod participant;
mod session;
mod tag;
mod template;
mod ulid;
mod user;

pub use category::*;
pub use event::*;
pub use event_old_slug::*;
pub use event_participant::*;
pub use event_tag::*;
pub use group::*;
pub use location::*;
pub use participant::*;
pub use session::*;
pub use tag::*;
pub use template::*;
pub use user::*;

pub use self::ulid::Ulid;
