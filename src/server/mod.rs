pub mod dispatcher;
pub(crate) mod registry;

pub use dispatcher::Dispatcher;
