//! tsrepl-dispatch: routes editor text into the interpreter session.
//!
//! Every operation reduces to [`Dispatcher::send_text`], which ensures a
//! session exists and writes one newline-terminated payload to it. File
//! loads become a module import built by [`import_statement`].

pub mod dispatcher;
pub mod error;
pub mod load;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use load::import_statement;
