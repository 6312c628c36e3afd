//! > Serve a directory over HTTP, straight into your browser
//!
//! `dir-serve` hosts the files of a local directory on `localhost`, preferring
//! port 8000 and stepping to 8001 when something else already took it.  It
//! prioritizes small size and compile times over speed, scalability, or
//! security.
//!
//! # Example
//!
//! ```rust,no_run
//! let path = std::env::current_dir().unwrap();
//! let server = dir_serve::Server::new(&path);
//!
//! println!("Serving {}", path.display());
//! println!("See http://{}", server.addr());
//! println!("Hit CTRL-C to stop");
//!
//! server.serve().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod handler;
mod port;
mod server;

pub use error::Error;
pub use server::{DEFAULT_PORT, Server, ServerBuilder};
