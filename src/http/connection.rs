use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::framer::{FrameError, FramedMessage, RequestFramer};
use crate::http::writer::ResponseWriter;
use crate::server::dispatcher::Dispatcher;

/// One client connection carrying exactly one request.
pub struct Connection<S> {
    stream: S,
    dispatcher: Dispatcher,
    framer: RequestFramer,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(FramedMessage),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Dispatcher, framer: RequestFramer) -> Self {
        Self {
            stream,
            dispatcher,
            framer,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.framer.read_message(&mut self.stream).await {
                    Ok(message) => {
                        self.state = ConnectionState::Processing(message);
                    }
                    Err(e) => {
                        // Transport failures never get a response
                        match e {
                            FrameError::ConnectionClosed => {
                                tracing::debug!("Client closed connection without a request")
                            }
                            other => tracing::warn!(error = %other, "Dropping connection"),
                        }
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(message) => {
                    let response = self.dispatcher.dispatch(message).await;
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(writer) => {
                    let result = writer.write_to_stream(&mut self.stream).await;
                    self.state = ConnectionState::Closed;
                    result?;
                }

                ConnectionState::Closed => {
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }
}
