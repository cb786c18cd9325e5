use std::{
    io,
    net::{SocketAddr, TcpListener, ToSocketAddrs},
};

use threadpool::ThreadPool;
use tracing::{debug, warn};

use crate::{serve, App};

/// Accept loop dispatching every inbound connection to a pool worker, so a
/// slow upload never blocks acceptance of the next connection.
pub struct Server {
    listener: TcpListener,
    thread_pool: ThreadPool,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        Default::default()
    }

    pub fn try_bind<A: ToSocketAddrs>(addr: A) -> io::Result<Server> {
        Self::builder().try_bind(addr)
    }

    /// The address the listener actually bound to. Useful when binding to
    /// port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn serve<Handle>(self, app: Handle) -> io::Result<()>
    where
        Handle: App,
        Handle: Send + Clone + 'static,
    {
        for conn in self.listener.incoming() {
            match conn {
                Ok(stream) => {
                    let app = app.clone();
                    self.thread_pool.execute(move || {
                        if let Err(err) = serve(stream, &app) {
                            debug!(error = %err, "connection ended with an error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            }
        }

        Ok(())
    }
}

pub struct ServerBuilder {
    max_threads: usize,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self { max_threads: 512 }
    }
}

impl ServerBuilder {
    pub fn max_threads(self, max_threads: usize) -> Self {
        Self { max_threads }
    }

    pub fn try_bind<A: ToSocketAddrs>(self, addr: A) -> io::Result<Server> {
        Ok(Server {
            listener: TcpListener::bind(addr)?,
            thread_pool: ThreadPool::new(self.max_threads),
        })
    }
}
