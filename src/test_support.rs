use crate::session::{ConnectionParams, Transport};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// In-memory transport that replays canned reply bytes and records writes.
///
/// Once the canned bytes run out, reads return end of stream, which the
/// codec reports as a disconnect.
pub(crate) struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
    fail_writes: bool,
}

impl ScriptedStream {
    pub(crate) fn new(replies: impl Into<Vec<u8>>) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            input: Cursor::new(replies.into()),
            written: Arc::clone(&written),
            fail_writes: false,
        };
        (stream, written)
    }

    /// A stream whose peer has gone away: every write fails.
    pub(crate) fn broken_pipe() -> Self {
        let (mut stream, _) = Self::new(Vec::new());
        stream.fail_writes = true;
        stream
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.written
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedStream {}

/// `count` null bulk replies back to back.
pub(crate) fn null_replies(count: usize) -> Vec<u8> {
    b"$-1\r\n".repeat(count)
}

/// Decode every command frame in `bytes`.
pub(crate) fn sent_commands(bytes: &Mutex<Vec<u8>>) -> Vec<Vec<String>> {
    let bytes = bytes.lock().unwrap_or_else(|poison| poison.into_inner()).clone();
    let mut cursor = Cursor::new(bytes);
    let mut commands = Vec::new();
    while let Some(command) = read_command(&mut cursor) {
        commands.push(command);
    }
    commands
}

/// Read one array-of-bulk-strings frame; `None` at end of stream or on garbage.
fn read_command<R: BufRead>(reader: &mut R) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).ok()?;
        buf.truncate(len);
        args.push(String::from_utf8(buf).ok()?);
    }
    Some(args)
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

type Store = Arc<Mutex<HashMap<String, Entry>>>;

/// Minimal coordinator over real TCP, one thread per connection.
///
/// Understands AUTH, SELECT, PING, SET (NX/PX), GET, EVAL of the release
/// script, and QUIT. Keys honour their PX expiry.
pub(crate) struct FakeCoordinator {
    addr: SocketAddr,
    store: Store,
    set_count: Arc<AtomicUsize>,
}

impl FakeCoordinator {
    pub(crate) fn start() -> Self {
        Self::start_with_password(None)
    }

    pub(crate) fn start_with_password(password: Option<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let store: Store = Arc::default();
        let set_count = Arc::new(AtomicUsize::new(0));
        let password = password.map(str::to_string);

        let server_store = Arc::clone(&store);
        let server_count = Arc::clone(&set_count);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let store = Arc::clone(&server_store);
                let count = Arc::clone(&server_count);
                let password = password.clone();
                std::thread::spawn(move || serve(stream, store, count, password));
            }
        });

        Self {
            addr,
            store,
            set_count,
        }
    }

    pub(crate) fn params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            max_connect_attempts: 1,
            ..ConnectionParams::default()
        }
    }

    /// Current live value of `key`.
    pub(crate) fn get(&self, key: &str) -> Option<String> {
        let mut store = self.store.lock().unwrap();
        live(&mut store, key).map(|e| e.value.clone())
    }

    /// Store `value` under `key` as another holder would.
    pub(crate) fn hold(&self, key: &str, value: &str, ttl: Duration) {
        self.store.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
    }

    pub(crate) fn remove(&self, key: &str) {
        self.store.lock().unwrap().remove(key);
    }

    /// Number of SET commands received so far.
    pub(crate) fn set_count(&self) -> usize {
        self.set_count.load(Ordering::SeqCst)
    }
}

fn live<'a>(store: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
    let expired = store
        .get(key)
        .and_then(|e| e.expires_at)
        .is_some_and(|at| Instant::now() >= at);
    if expired {
        store.remove(key);
    }
    store.get(key)
}

fn serve(stream: TcpStream, store: Store, set_count: Arc<AtomicUsize>, password: Option<String>) {
    let Ok(read_half) = stream.try_clone() else { return };
    let mut reader = BufReader::new(read_half);
    let mut writer = stream;
    let mut authenticated = password.is_none();

    while let Some(args) = read_command(&mut reader) {
        let Some(name) = args.first().map(|n| n.to_ascii_uppercase()) else {
            return;
        };

        let reply = match name.as_str() {
            "AUTH" => {
                if args.last() == password.as_ref() && password.is_some() {
                    authenticated = true;
                    "+OK".to_string()
                } else {
                    "-WRONGPASS invalid username-password pair or user is disabled.".to_string()
                }
            }
            "QUIT" => {
                let _ = writer.write_all(b"+OK\r\n");
                return;
            }
            _ if !authenticated => "-NOAUTH Authentication required.".to_string(),
            "PING" => "+PONG".to_string(),
            "SELECT" => match args.get(1).and_then(|i| i.parse::<u32>().ok()) {
                Some(index) if index < 16 => "+OK".to_string(),
                _ => "-ERR DB index is out of range".to_string(),
            },
            "SET" => {
                set_count.fetch_add(1, Ordering::SeqCst);
                handle_set(&store, &args)
            }
            "GET" => {
                let mut store = store.lock().unwrap();
                let entry = match args.get(1) {
                    Some(key) => live(&mut store, key),
                    None => None,
                };
                match entry {
                    Some(entry) => format!("${}\r\n{}", entry.value.len(), entry.value),
                    None => "$-1".to_string(),
                }
            }
            "EVAL" => handle_release_script(&store, &args),
            _ => format!("-ERR unknown command '{}'", name),
        };

        if writer.write_all(format!("{}\r\n", reply).as_bytes()).is_err() {
            return;
        }
    }
}

fn handle_set(store: &Store, args: &[String]) -> String {
    let (Some(key), Some(value)) = (args.get(1), args.get(2)) else {
        return "-ERR wrong number of arguments for 'set' command".to_string();
    };
    let options: Vec<String> = args[3..].iter().map(|a| a.to_ascii_uppercase()).collect();
    let nx = options.iter().any(|o| o == "NX");
    let ttl = options
        .iter()
        .position(|o| o == "PX")
        .and_then(|i| args.get(3 + i + 1))
        .and_then(|ms| ms.parse::<u64>().ok())
        .map(Duration::from_millis);

    let mut store = store.lock().unwrap();
    if nx && live(&mut store, key).is_some() {
        return "$-1".to_string();
    }
    store.insert(
        key.clone(),
        Entry {
            value: value.clone(),
            expires_at: ttl.map(|t| Instant::now() + t),
        },
    );
    "+OK".to_string()
}

fn handle_release_script(store: &Store, args: &[String]) -> String {
    let (Some(key), Some(token)) = (args.get(3), args.get(4)) else {
        return "-ERR wrong number of arguments for 'eval' command".to_string();
    };
    let mut store = store.lock().unwrap();
    let owned = live(&mut store, key).is_some_and(|e| &e.value == token);
    if owned {
        store.remove(key);
        ":1".to_string()
    } else {
        ":0".to_string()
    }
}
