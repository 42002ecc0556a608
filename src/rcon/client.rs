use super::{
    packet::{
        read_packet,
        write_packet,
        Packet,
        MAX_COMMAND_LEN,
        TYPE_AUTH_RESPONSE,
        TYPE_COMMAND,
        TYPE_LOGIN,
        TYPE_RESPONSE_VALUE,
    },
    Transport,
    TransportError,
};
use futures::future::BoxFuture;
use std::{
    sync::atomic::{
        AtomicI32,
        Ordering,
    },
    time::Duration,
};
use tokio::{
    net::TcpStream,
    sync::Mutex,
};

/// A lazily connected RCON client.
///
/// The connection is opened and authenticated on first use and reused
/// afterwards. Any I/O, protocol or timeout error, or a request future being
/// dropped mid-flight, closes it so the next command reconnects. Commands are
/// serialized over the single connection.
pub struct RconClient {
    address: String,
    password: String,
    timeout: Duration,
    connection: Mutex<Option<TcpStream>>,
    next_id: AtomicI32,
}

impl std::fmt::Debug for RconClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RconClient")
            .field("address", &self.address)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RconClient {
    pub fn new(address: impl Into<String>, password: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            timeout,
            connection: Mutex::new(None),
            next_id: AtomicI32::new(1),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn request_id(&self) -> i32 {
        // -1 is reserved for failed logins
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id < 0 {
            self.next_id.store(1, Ordering::Relaxed);
            return self.next_id.fetch_add(1, Ordering::Relaxed);
        }
        id
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        debug!(address = %self.address, "Connecting to RCON");
        let mut stream = TcpStream::connect(&self.address).await?;
        stream.set_nodelay(true)?;

        let id = self.request_id();
        write_packet(&mut stream, &Packet::new(id, TYPE_LOGIN, self.password.as_str())).await?;

        // Some servers send an empty value packet ahead of the auth response.
        let mut response = read_packet(&mut stream).await?;
        if response.kind == TYPE_RESPONSE_VALUE {
            response = read_packet(&mut stream).await?;
        }

        if response.kind != TYPE_AUTH_RESPONSE {
            return Err(TransportError::Protocol(format!(
                "expected auth response, got packet type {}",
                response.kind
            )));
        }
        if response.id == -1 {
            return Err(TransportError::Authentication);
        }
        if response.id != id {
            return Err(TransportError::Protocol(format!(
                "auth response id {} does not match request id {id}",
                response.id
            )));
        }

        info!(address = %self.address, "RCON session established");
        Ok(stream)
    }

    /// Sends `command` followed by an empty sentinel packet and joins every
    /// response fragment until the sentinel's reply arrives. Replies longer
    /// than 4096 bytes are split over several packets sharing the request id.
    async fn round_trip(&self, stream: &mut TcpStream, command: &str) -> Result<String, TransportError> {
        let id = self.request_id();
        let sentinel = self.request_id();
        write_packet(stream, &Packet::new(id, TYPE_COMMAND, command)).await?;
        write_packet(stream, &Packet::new(sentinel, TYPE_RESPONSE_VALUE, "")).await?;

        let mut body = String::new();
        let mut fragments = 0usize;
        loop {
            let response = read_packet(stream).await?;
            if response.id == sentinel {
                break;
            }
            if response.kind != TYPE_RESPONSE_VALUE {
                return Err(TransportError::Protocol(format!(
                    "expected response value, got packet type {}",
                    response.kind
                )));
            }
            if response.id != id {
                return Err(TransportError::Protocol(format!(
                    "response id {} does not match request id {id}",
                    response.id
                )));
            }
            body.push_str(&response.body);
            fragments += 1;
        }

        if fragments == 0 {
            return Err(TransportError::Protocol(format!("no response to request id {id}")));
        }
        if fragments > 1 {
            trace!(command, fragments, len = body.len(), "Joined multi-packet reply");
        }
        Ok(body)
    }

    /// The stream leaves the shared slot for the round-trip and is put back
    /// only when it completed, so a dropped or failed request closes it.
    async fn exchange(&self, command: &str) -> Result<String, TransportError> {
        if command.len() > MAX_COMMAND_LEN {
            return Err(TransportError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_LEN,
            });
        }

        let mut connection = self.connection.lock().await;
        let pooled = connection.take();

        let result = tokio::time::timeout(self.timeout, async move {
            let mut stream = match pooled {
                Some(stream) => stream,
                None => self.connect().await?,
            };
            let reply = self.round_trip(&mut stream, command).await?;
            Ok::<_, TransportError>((stream, reply))
        })
        .await
        .unwrap_or(Err(TransportError::Timeout(self.timeout)));

        match result {
            Ok((stream, reply)) => {
                *connection = Some(stream);
                Ok(reply)
            }
            Err(e) => {
                debug!(command, error = %e, "Dropping RCON connection");
                Err(e)
            }
        }
    }
}

impl Transport for RconClient {
    fn execute<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String, TransportError>> {
        Box::pin(async move {
            trace!(command, "RCON request");
            let reply = self.exchange(command).await?;
            trace!(command, reply = %reply, "RCON reply");
            Ok(reply)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{
        atomic::AtomicBool,
        Arc,
    };
    use tokio::net::TcpListener;

    /// Largest body a vanilla server puts into one response packet.
    const FRAGMENT_LEN: usize = 4096;

    struct FakeServer {
        password: &'static str,
        reply: fn(&str) -> String,
        /// Delays the very first command reply once.
        first_reply_delay: Option<Duration>,
    }

    impl FakeServer {
        fn new(password: &'static str, reply: fn(&str) -> String) -> Self {
            Self {
                password,
                reply,
                first_reply_delay: None,
            }
        }

        fn delay_first_reply(mut self, delay: Duration) -> Self {
            self.first_reply_delay = Some(delay);
            self
        }

        /// Accepts connections until the test ends. Command replies are split
        /// into 4096 byte fragments and sentinel packets are answered the way
        /// vanilla answers unknown request types.
        async fn spawn(self) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let address = listener.local_addr().unwrap().to_string();
            let delayed = Arc::new(AtomicBool::new(false));
            let Self {
                password,
                reply,
                first_reply_delay,
            } = self;

            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let delayed = Arc::clone(&delayed);
                    tokio::spawn(serve_connection(stream, password, reply, first_reply_delay, delayed));
                }
            });

            address
        }
    }

    async fn serve_connection(
        mut stream: TcpStream,
        password: &'static str,
        reply: fn(&str) -> String,
        first_reply_delay: Option<Duration>,
        delayed: Arc<AtomicBool>,
    ) {
        let Ok(login) = read_packet(&mut stream).await else {
            return;
        };
        assert_eq!(login.kind, TYPE_LOGIN);
        let id = if login.body == password { login.id } else { -1 };
        if write_packet(&mut stream, &Packet::new(id, TYPE_AUTH_RESPONSE, "")).await.is_err() {
            return;
        }

        while let Ok(request) = read_packet(&mut stream).await {
            let bodies = if request.kind == TYPE_COMMAND {
                if let Some(delay) = first_reply_delay {
                    if !delayed.swap(true, Ordering::SeqCst) {
                        tokio::time::sleep(delay).await;
                    }
                }
                let text = reply(&request.body);
                let bodies: Vec<String> = text
                    .as_bytes()
                    .chunks(FRAGMENT_LEN)
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect();
                if bodies.is_empty() {
                    vec![String::new()]
                } else {
                    bodies
                }
            } else {
                vec![format!("Unknown request {:x}", request.kind)]
            };

            for body in bodies {
                let response = Packet::new(request.id, TYPE_RESPONSE_VALUE, body);
                if write_packet(&mut stream, &response).await.is_err() {
                    return;
                }
            }
        }
    }

    fn many_players(_: &str) -> String {
        let names: Vec<String> = (0..400).map(|i| format!("Player{i:03}")).collect();
        format!(
            "There are 400 of a max of 500 players online: {}",
            names.join(", ")
        )
    }

    #[tokio::test]
    async fn authenticates_and_executes() {
        let address = FakeServer::new("hunter2", |command| format!("echo: {command}")).spawn().await;
        let client = RconClient::new(address, "hunter2", Duration::from_secs(2));

        assert_eq!(client.execute("list").await.unwrap(), "echo: list");
        assert_eq!(client.execute("time query day").await.unwrap(), "echo: time query day");
    }

    #[tokio::test]
    async fn empty_replies_are_returned_as_empty_strings() {
        let address = FakeServer::new("", |_| String::new()).spawn().await;
        let client = RconClient::new(address, "", Duration::from_secs(2));

        assert_eq!(client.execute("say hi").await.unwrap(), "");
    }

    #[tokio::test]
    async fn wrong_password_is_an_authentication_error() {
        let address = FakeServer::new("hunter2", |_| String::new()).spawn().await;
        let client = RconClient::new(address, "wrong", Duration::from_secs(2));

        let err = client.execute("list").await.unwrap_err();
        assert!(matches!(err, TransportError::Authentication), "{err}");
    }

    #[tokio::test]
    async fn multi_packet_replies_are_joined() {
        let address = FakeServer::new("", |command| match command {
            "list" => many_players(command),
            other => format!("echo: {other}"),
        })
        .spawn()
        .await;
        let client = RconClient::new(address, "", Duration::from_secs(2));

        let reply = client.execute("list").await.unwrap();
        assert!(reply.len() > FRAGMENT_LEN);
        assert_eq!(reply, many_players("list"));
        assert!(reply.ends_with("Player399"));

        // Nothing is left over for the next command.
        assert_eq!(client.execute("difficulty").await.unwrap(), "echo: difficulty");
    }

    #[tokio::test]
    async fn dropped_request_does_not_poison_the_connection() {
        let address = FakeServer::new("", |command| format!("echo: {command}"))
            .delay_first_reply(Duration::from_millis(200))
            .spawn()
            .await;
        let client = RconClient::new(address, "", Duration::from_secs(2));

        let dropped = tokio::time::timeout(Duration::from_millis(50), client.execute("list")).await;
        assert!(dropped.is_err());

        assert_eq!(client.execute("difficulty").await.unwrap(), "echo: difficulty");
        assert_eq!(client.execute("list").await.unwrap(), "echo: list");
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = RconClient::new(address, "", Duration::from_millis(100));
        let err = client.execute("list").await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn overlong_commands_are_rejected_locally() {
        let client = RconClient::new("127.0.0.1:1", "", Duration::from_millis(100));
        let command = "say ".to_string() + &"a".repeat(MAX_COMMAND_LEN);

        let err = client.execute(&command).await.unwrap_err();
        assert!(matches!(err, TransportError::CommandTooLong { .. }), "{err}");
    }
}
