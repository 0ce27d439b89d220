//! A simulated ETH008 listening on loopback.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use eth008::Session;

pub const MODULE_ID: u8 = 19;
pub const HW_VERSION: u8 = 1;
pub const FW_VERSION: u8 = 5;
pub const UNLOCK_SECONDS: u8 = 60;

#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Module is locked until this password is sent.
    pub password: Option<String>,
    pub outputs: u8,
    /// Reply 1 to a correct password without starting the unlock timer.
    pub accept_without_unlock: bool,
    /// Answer GET_INFO with two bytes and hang up.
    pub truncate_info: bool,
    /// Read requests but never answer.
    pub silent: bool,
}

#[derive(Debug, Default)]
pub struct ModuleState {
    pub outputs: u8,
    pub unlock_seconds: u8,
    pub frames: Vec<Vec<u8>>,
}

pub struct FakeModule {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ModuleState>>,
    handle: JoinHandle<()>,
}

impl FakeModule {
    pub fn spawn(behavior: Behavior) -> FakeModule {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ModuleState {
            outputs: behavior.outputs,
            unlock_seconds: if behavior.password.is_some() {
                0
            } else {
                UNLOCK_SECONDS
            },
            frames: Vec::new(),
        }));
        let shared = state.clone();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream, &behavior, &shared);
        });
        FakeModule {
            addr,
            state,
            handle,
        }
    }

    pub fn session(&self) -> Session<TcpStream> {
        let stream = TcpStream::connect(self.addr).unwrap();
        Session::new(stream).with_timeout(Duration::from_millis(500))
    }

    pub fn outputs(&self) -> u8 {
        self.state.lock().unwrap().outputs
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().frames.clone()
    }

    /// Wait for the module to see the client hang up.
    pub fn join(self) -> ModuleState {
        self.handle.join().unwrap();
        Arc::try_unwrap(self.state).unwrap().into_inner().unwrap()
    }
}

fn serve(mut stream: TcpStream, behavior: &Behavior, state: &Mutex<ModuleState>) {
    let mut buf = [0u8; 100];
    loop {
        // the client waits for each reply, so one read is one frame
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let frame = buf[..n].to_vec();
        if behavior.silent {
            state.lock().unwrap().frames.push(frame);
            continue;
        }
        if behavior.truncate_info && frame[0] == 0x10 {
            state.lock().unwrap().frames.push(frame);
            let _ = stream.write_all(&[MODULE_ID, HW_VERSION]);
            return;
        }
        let reply = respond(&frame, behavior, &mut state.lock().unwrap());
        if stream.write_all(&reply).is_err() {
            return;
        }
    }
}

fn respond(frame: &[u8], behavior: &Behavior, state: &mut ModuleState) -> Vec<u8> {
    state.frames.push(frame.to_vec());
    let unlocked = state.unlock_seconds > 0;
    match frame[0] {
        0x10 => vec![MODULE_ID, HW_VERSION, FW_VERSION],
        0x7a => vec![state.unlock_seconds],
        0x79 => {
            let sent = &frame[1..];
            let ok = behavior.password.as_deref().map(str::as_bytes) == Some(sent);
            if ok && !behavior.accept_without_unlock {
                state.unlock_seconds = UNLOCK_SECONDS;
            }
            vec![ok as u8]
        }
        0x7b => {
            if behavior.password.is_some() {
                state.unlock_seconds = 0;
            }
            vec![0]
        }
        0x24 => vec![state.outputs],
        op @ 0x20 | op @ 0x21 => {
            let output = frame[1];
            if unlocked && output >= 1 && output <= 8 {
                let mask = 1u8 << (output - 1);
                if op == 0x20 {
                    state.outputs |= mask;
                } else {
                    state.outputs &= !mask;
                }
                vec![0]
            } else {
                vec![1]
            }
        }
        _ => vec![0xff],
    }
}
