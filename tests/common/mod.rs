//! In-memory fakes implementing the client's transport seam.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use vset_rs::{Reply, Transport, TransportError};

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

enum Outcome {
    Reply(Reply),
    /// Simulate a transport-level failure (connection drop).
    Down,
}

/// A scripted transport: rules map argv predicates to canned replies.
/// Every submitted command is logged for traffic assertions.
pub struct FakeTransport {
    rules: Mutex<Vec<(Matcher, Outcome)>>,
    log: Mutex<Vec<Vec<String>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rules: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
        })
    }

    /// First matching rule wins.
    pub fn on(&self, matcher: impl Fn(&[String]) -> bool + Send + Sync + 'static, reply: Reply) {
        self.rules
            .lock()
            .push((Box::new(matcher), Outcome::Reply(reply)));
    }

    /// Commands matching this predicate fail at the transport level.
    pub fn down_on(&self, matcher: impl Fn(&[String]) -> bool + Send + Sync + 'static) {
        self.rules.lock().push((Box::new(matcher), Outcome::Down));
    }

    /// All commands submitted so far, as lossy strings.
    pub fn sent(&self) -> Vec<Vec<String>> {
        self.log.lock().clone()
    }

    pub fn sent_commands(&self) -> Vec<String> {
        self.sent().iter().map(|argv| argv[0].clone()).collect()
    }

    fn answer(&self, argv: &[String]) -> Result<Reply, TransportError> {
        let rules = self.rules.lock();
        for (matcher, outcome) in rules.iter() {
            if matcher(argv) {
                return match outcome {
                    Outcome::Reply(reply) => Ok(reply.clone()),
                    Outcome::Down => Err(TransportError::ConnectionClosed),
                };
            }
        }
        panic!("no fake rule matches {:?}", argv);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, args: &[Bytes]) -> Result<Reply, TransportError> {
        let argv = to_strings(args);
        self.log.lock().push(argv.clone());
        self.answer(&argv)
    }

    async fn request_pipeline(
        &self,
        commands: &[Vec<Bytes>],
    ) -> Result<Vec<Reply>, TransportError> {
        let mut replies = Vec::with_capacity(commands.len());
        for cmd in commands {
            let argv = to_strings(cmd);
            self.log.lock().push(argv.clone());
            replies.push(self.answer(&argv)?);
        }
        Ok(replies)
    }
}

fn to_strings(args: &[Bytes]) -> Vec<String> {
    args.iter()
        .map(|a| String::from_utf8_lossy(a).into_owned())
        .collect()
}

/// Convenience predicates and constructors for test scripts.
pub fn starts_with(prefix: &'static [&'static str]) -> impl Fn(&[String]) -> bool {
    move |argv| {
        argv.len() >= prefix.len()
            && argv.iter().zip(prefix.iter()).all(|(a, p)| a.as_str() == *p)
    }
}

pub fn has_token(token: &'static str) -> impl Fn(&[String]) -> bool {
    move |argv| argv.iter().any(|a| a == token)
}

pub fn bulk(s: &str) -> Reply {
    Reply::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

pub fn bulk_array(items: &[&str]) -> Reply {
    Reply::Array(items.iter().map(|s| bulk(s)).collect())
}

/// A stateful fake engine store: enough of the hash/string command set
/// for the embedding cache (HGET/HSET/HDEL/HLEN/HGETALL, GET/SET/DEL).
/// Hash enumeration preserves insertion order, so eviction tie-break is
/// deterministic in tests.
pub struct FakeStore {
    hashes: Mutex<HashMap<String, Vec<(String, Bytes)>>>,
    strings: Mutex<HashMap<String, Bytes>>,
    fail_all: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            hashes: Mutex::new(HashMap::new()),
            strings: Mutex::new(HashMap::new()),
            fail_all: AtomicBool::new(false),
        })
    }

    /// Make every subsequent command fail at the transport level.
    pub fn break_store(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn hash_fields(&self, key: &str) -> Vec<String> {
        self.hashes
            .lock()
            .get(key)
            .map(|pairs| pairs.iter().map(|(f, _)| f.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.hashes.lock().contains_key(key) || self.strings.lock().contains_key(key)
    }

    fn apply(&self, argv: &[String]) -> Reply {
        match argv[0].as_str() {
            "HSET" => {
                let mut hashes = self.hashes.lock();
                let entries = hashes.entry(argv[1].clone()).or_default();
                let value = Bytes::copy_from_slice(argv[3].as_bytes());
                if let Some(slot) = entries.iter_mut().find(|(f, _)| *f == argv[2]) {
                    slot.1 = value;
                    Reply::Integer(0)
                } else {
                    entries.push((argv[2].clone(), value));
                    Reply::Integer(1)
                }
            }
            "HGET" => {
                let hashes = self.hashes.lock();
                hashes
                    .get(&argv[1])
                    .and_then(|entries| entries.iter().find(|(f, _)| *f == argv[2]))
                    .map(|(_, v)| Reply::Bulk(v.clone()))
                    .unwrap_or(Reply::Nil)
            }
            "HDEL" => {
                let mut hashes = self.hashes.lock();
                let mut removed = 0;
                if let Some(entries) = hashes.get_mut(&argv[1]) {
                    for field in &argv[2..] {
                        if let Some(pos) = entries.iter().position(|(f, _)| f == field) {
                            entries.remove(pos);
                            removed += 1;
                        }
                    }
                }
                Reply::Integer(removed)
            }
            "HLEN" => {
                let hashes = self.hashes.lock();
                Reply::Integer(hashes.get(&argv[1]).map(|e| e.len()).unwrap_or(0) as i64)
            }
            "HGETALL" => {
                let hashes = self.hashes.lock();
                let mut items = Vec::new();
                if let Some(entries) = hashes.get(&argv[1]) {
                    for (field, value) in entries {
                        items.push(bulk(field));
                        items.push(Reply::Bulk(value.clone()));
                    }
                }
                Reply::Array(items)
            }
            "GET" => {
                let strings = self.strings.lock();
                strings
                    .get(&argv[1])
                    .map(|v| Reply::Bulk(v.clone()))
                    .unwrap_or(Reply::Nil)
            }
            "SET" => {
                self.strings
                    .lock()
                    .insert(argv[1].clone(), Bytes::copy_from_slice(argv[2].as_bytes()));
                Reply::Simple("OK".into())
            }
            "DEL" => {
                let mut removed = 0;
                for key in &argv[1..] {
                    if self.hashes.lock().remove(key).is_some() {
                        removed += 1;
                    }
                    if self.strings.lock().remove(key).is_some() {
                        removed += 1;
                    }
                }
                Reply::Integer(removed)
            }
            other => panic!("fake store does not understand {}", other),
        }
    }
}

#[async_trait]
impl Transport for FakeStore {
    async fn request(&self, args: &[Bytes]) -> Result<Reply, TransportError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(self.apply(&to_strings(args)))
    }

    async fn request_pipeline(
        &self,
        commands: &[Vec<Bytes>],
    ) -> Result<Vec<Reply>, TransportError> {
        let mut replies = Vec::with_capacity(commands.len());
        for cmd in commands {
            replies.push(self.request(cmd).await?);
        }
        Ok(replies)
    }
}
