mod store;

pub use store::{Session, SessionScope, SessionStore, SharedSignal};
