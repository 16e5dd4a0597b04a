mod event;
pub use self::event::*;
