use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tiny_http::ResponseBox;

use crate::error::Error;
use crate::handler;
use crate::port;

/// Port tried first when none is configured
pub const DEFAULT_PORT: u16 = 8000;

pub(crate) type Handler =
    dyn Fn(&Path, &str) -> Result<ResponseBox, Error> + Send + Sync;

/// Custom server settings
pub struct ServerBuilder {
    source: PathBuf,
    port: Option<u16>,
    handler: Option<Arc<Handler>>,
}

impl ServerBuilder {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            port: None,
            handler: None,
        }
    }

    /// Override the port tried first
    ///
    /// When it is occupied, the next port is used instead.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Override how requests are answered
    ///
    /// The default answers out of the source directory.  A returned `Err` is
    /// reported to the client as a 500.
    pub fn handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Path, &str) -> Result<ResponseBox, Error> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Create a server
    ///
    /// This fixes the effective port, falling back once if the preferred one
    /// is occupied.
    pub fn build(&self) -> Server {
        let port = port::resolve(self.port.unwrap_or(DEFAULT_PORT));

        Server {
            source: self.source.clone(),
            addr: format!("localhost:{port}"),
            port,
            handler: self
                .handler
                .clone()
                .unwrap_or_else(|| Arc::new(handler::serve_file)),
            server: RwLock::new(None),
        }
    }

    /// Start the webserver
    pub fn serve(&self) -> Result<(), Error> {
        self.build().serve()
    }
}

pub struct Server {
    source: PathBuf,
    addr: String,
    port: u16,
    handler: Arc<Handler>,
    server: RwLock<Option<tiny_http::Server>>,
}

impl Server {
    /// Serve `source` on the default port, or the next one over
    pub fn new(source: impl Into<PathBuf>) -> Self {
        ServerBuilder::new(source).build()
    }

    /// The directory being served
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    /// The address the server is available at
    ///
    /// This is useful for telling users where to point their browser since
    /// the port may have moved over by one.
    pub fn addr(&self) -> &str {
        self.addr.as_str()
    }

    /// The effective port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the server was running at the instant the call happened
    pub fn is_running(&self) -> bool {
        matches!(self.server.read().as_deref(), Ok(Some(_)))
    }

    /// Run the accept loop until [`Server::close`] is called
    ///
    /// The loop is blocking and handles one request at a time.  Binding can
    /// fail, for example when the fallback port is occupied as well; nothing
    /// is retried.
    pub fn serve(&self) -> Result<(), Error> {
        {
            let mut slot = self
                .server
                .try_write()
                .map_err(|_| Error::new("the server is running"))?;
            if slot.is_some() {
                return Err(Error::new("the server is running"));
            }
            *slot = Some(tiny_http::Server::http(("0.0.0.0", self.port)).map_err(Error::new)?);
        }

        {
            let slot = self.server.read().map_err(Error::new)?;
            if let Some(listener) = slot.as_ref() {
                for request in listener.incoming_requests() {
                    handler::handle(&self.source, request, &*self.handler);
                }
            }
        }

        *self.server.write().map_err(Error::new)? = None;

        Ok(())
    }

    /// Unblock the accept loop, letting [`Server::serve`] return
    ///
    /// Safe to call from another thread, e.g. an interrupt handler.
    pub fn close(&self) {
        if let Ok(Some(listener)) = self.server.read().as_deref() {
            listener.unblock();
        }
    }
}
