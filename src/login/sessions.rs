// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

const SESSION_CHANNEL_DEPTH: usize = 64;
const MAX_SESSIONS: usize = 10000;

#[derive(Debug)]
pub enum SessionError {
    Unavailable,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Unavailable => write!(f, "Session store unavailable"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Opaque-token session store. A background task owns the map; callers
/// talk to it over a channel, so no lock is shared across requests.
#[derive(Clone)]
pub struct SessionStore {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_DEPTH);
        tokio::spawn(async move {
            let mut state = SessionState::new();
            state.run(receiver).await;
        });
        Self { sender }
    }

    /// Issue a fresh session token for a user id.
    pub async fn issue(&self, user_id: u32, ttl_seconds: u64) -> Result<String, SessionError> {
        let (reply, receive) = oneshot::channel();
        let command = SessionCommand::Issue {
            user_id,
            ttl_seconds,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(SessionError::Unavailable);
        }
        receive.await.map_err(|_| SessionError::Unavailable)
    }

    /// Resolve a token to the user id it was issued for, if still valid.
    pub async fn resolve(&self, token: &str) -> Option<u32> {
        let (reply, receive) = oneshot::channel();
        let command = SessionCommand::Resolve {
            token: token.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return None;
        }
        receive.await.unwrap_or(None)
    }

    pub fn invalidate(&self, token: &str) {
        let _ = self.sender.try_send(SessionCommand::Invalidate {
            token: token.to_string(),
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

enum SessionCommand {
    Issue {
        user_id: u32,
        ttl_seconds: u64,
        reply: oneshot::Sender<String>,
    },
    Resolve {
        token: String,
        reply: oneshot::Sender<Option<u32>>,
    },
    Invalidate {
        token: String,
    },
}

struct SessionRecord {
    user_id: u32,
    expires_at: Instant,
}

struct SessionState {
    sessions: HashMap<String, SessionRecord>,
    session_order: VecDeque<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            session_order: VecDeque::new(),
        }
    }

    async fn run(&mut self, mut receiver: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                SessionCommand::Issue {
                    user_id,
                    ttl_seconds,
                    reply,
                } => {
                    let _ = reply.send(self.issue_session(user_id, ttl_seconds));
                }
                SessionCommand::Resolve { token, reply } => {
                    let _ = reply.send(self.resolve_session(&token));
                }
                SessionCommand::Invalidate { token } => {
                    self.invalidate_session(&token);
                }
            }
        }
    }

    fn issue_session(&mut self, user_id: u32, ttl_seconds: u64) -> String {
        let now = Instant::now();
        self.cleanup_expired(now);

        let token = generate_session_token();
        self.sessions.insert(
            token.clone(),
            SessionRecord {
                user_id,
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        self.session_order.push_back(token.clone());
        self.prune_overflow();

        token
    }

    fn resolve_session(&mut self, token: &str) -> Option<u32> {
        let now = Instant::now();
        self.cleanup_expired(now);

        let record = self.sessions.get(token)?;
        if record.expires_at <= now {
            self.invalidate_session(token);
            return None;
        }
        Some(record.user_id)
    }

    fn invalidate_session(&mut self, token: &str) {
        self.sessions.remove(token);
        self.session_order.retain(|id| id != token);
    }

    fn cleanup_expired(&mut self, now: Instant) {
        self.sessions.retain(|_, record| record.expires_at > now);
        self.session_order
            .retain(|id| self.sessions.contains_key(id));
    }

    fn prune_overflow(&mut self) {
        while self.sessions.len() > MAX_SESSIONS {
            if let Some(oldest) = self.session_order.pop_front() {
                self.sessions.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 18];
    OsRng.fill_bytes(&mut bytes);
    format!("ssn_{}", URL_SAFE_NO_PAD.encode(bytes))
}
