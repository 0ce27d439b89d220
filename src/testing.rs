use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use crate::transport::ModuleStream;

enum Step {
    Data(Vec<u8>),
    Fail(ErrorKind),
}

/// In-memory stream that plays back canned replies and records every write call.
/// Reading past the script behaves like a clean close.
pub(crate) struct ScriptedStream {
    script: VecDeque<Step>,
    write_cap: Option<usize>,
    write_error: Option<ErrorKind>,
    pub written: Vec<Vec<u8>>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        ScriptedStream {
            script: VecDeque::new(),
            write_cap: None,
            write_error: None,
            written: Vec::new(),
            read_timeout: None,
            write_timeout: None,
        }
    }

    pub fn reply(mut self, bytes: &[u8]) -> Self {
        self.script.push_back(Step::Data(bytes.to_vec()));
        self
    }

    pub fn fail(mut self, kind: ErrorKind) -> Self {
        self.script.push_back(Step::Fail(kind));
        self
    }

    pub fn write_cap(mut self, cap: usize) -> Self {
        self.write_cap = Some(cap);
        self
    }

    pub fn write_error(mut self, kind: ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    pub fn unread(&self) -> usize {
        self.script.len()
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            None => Ok(0),
            Some(Step::Fail(kind)) => Err(kind.into()),
            Some(Step::Data(mut data)) => {
                let n = buf.len().min(data.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.script.push_front(Step::Data(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(kind.into());
        }
        let n = self.write_cap.map_or(buf.len(), |cap| cap.min(buf.len()));
        self.written.push(buf[..n].to_vec());
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ModuleStream for ScriptedStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.write_timeout = timeout;
        Ok(())
    }
}
