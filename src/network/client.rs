//! Client
//!
//! Blocking client for the text protocol.

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, UndisError};
use crate::protocol::{StorageOp, CRLF};

/// One hit returned by `get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub key: String,
    pub flags: u32,
    pub data: Vec<u8>,
}

/// Connection to an Undis server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Prompt the server sends before every command
    prompt: Vec<u8>,
}

impl Client {
    /// Connect and consume the first prompt
    pub fn connect(addr: impl ToSocketAddrs, prompt: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let mut client = Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            prompt: prompt.as_bytes().to_vec(),
        };
        client.expect_prompt()?;
        Ok(client)
    }

    /// `get <keys...>`; misses are simply absent from the result
    pub fn get(&mut self, keys: &[&str]) -> Result<Vec<Value>> {
        self.send_line(format!("get {}", keys.join(" ")).as_bytes())?;

        let mut values = Vec::new();
        loop {
            let line = self.read_reply_line()?;
            if line == "END" {
                break;
            }

            let mut parts = line.split(' ');
            let (Some("VALUE"), Some(key), Some(flags), Some(len), None) =
                (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(Self::unexpected(&line));
            };
            let flags = flags.parse::<u32>().map_err(|_| Self::unexpected(&line))?;
            let len = len.parse::<usize>().map_err(|_| Self::unexpected(&line))?;

            let mut data = vec![0u8; len + CRLF.len()];
            self.reader.read_exact(&mut data)?;
            if !data.ends_with(CRLF) {
                return Err(UndisError::Protocol("data block not CRLF-terminated".to_string()));
            }
            data.truncate(len);

            values.push(Value {
                key: key.to_string(),
                flags,
                data,
            });
        }

        self.expect_prompt()?;
        Ok(values)
    }

    /// Run a storage command; returns whether the value was stored
    pub fn store(
        &mut self,
        op: StorageOp,
        key: &str,
        flags: u32,
        exptime: i64,
        value: &[u8],
    ) -> Result<bool> {
        let header = format!("{} {} {} {} {}", op.as_str(), key, flags, exptime, value.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(CRLF)?;
        self.send_line(value)?;

        let line = self.read_reply_line()?;
        let stored = match line.as_str() {
            "STORED" => true,
            "NOT_STORED" => false,
            _ => return Err(Self::unexpected(&line)),
        };

        self.expect_prompt()?;
        Ok(stored)
    }

    /// `set` shorthand
    pub fn set(&mut self, key: &str, value: &[u8], flags: u32, exptime: i64) -> Result<bool> {
        self.store(StorageOp::Set, key, flags, exptime, value)
    }

    /// `delete <key>`; returns whether the key existed
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.send_line(format!("delete {}", key).as_bytes())?;

        let line = self.read_reply_line()?;
        let deleted = match line.as_str() {
            "DELETED" => true,
            "NOT_FOUND" => false,
            _ => return Err(Self::unexpected(&line)),
        };

        self.expect_prompt()?;
        Ok(deleted)
    }

    /// Send a raw line and return its single-line reply
    pub fn raw(&mut self, line: &[u8]) -> Result<String> {
        self.send_line(line)?;
        let reply = self.read_reply_line()?;
        self.expect_prompt()?;
        Ok(reply)
    }

    /// End the session
    pub fn quit(mut self) -> Result<()> {
        self.send_line(b"quit")
    }

    fn send_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(CRLF)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read one reply line, turning error replies into errors
    fn read_reply_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Err(UndisError::Protocol("connection closed by server".to_string()));
        }
        if !line.ends_with(CRLF) {
            return Err(UndisError::Protocol("reply not CRLF-terminated".to_string()));
        }
        line.truncate(line.len() - CRLF.len());

        let line = String::from_utf8_lossy(&line).into_owned();
        if line == "ERROR" {
            self.expect_prompt()?;
            return Err(UndisError::Protocol("server rejected the command".to_string()));
        }
        if let Some(message) = line.strip_prefix("CLIENT_ERROR ") {
            let message = message.to_string();
            self.expect_prompt()?;
            return Err(UndisError::ClientData(message));
        }
        if let Some(message) = line.strip_prefix("SERVER_ERROR ") {
            let message = message.to_string();
            self.expect_prompt()?;
            return Err(UndisError::Protocol(format!("server error: {}", message)));
        }
        Ok(line)
    }

    fn expect_prompt(&mut self) -> Result<()> {
        let mut prompt = vec![0u8; self.prompt.len()];
        self.reader.read_exact(&mut prompt)?;
        if prompt != self.prompt {
            return Err(UndisError::Protocol(format!(
                "expected prompt {:?}, got {:?}",
                String::from_utf8_lossy(&self.prompt),
                String::from_utf8_lossy(&prompt)
            )));
        }
        Ok(())
    }

    fn unexpected(line: &str) -> UndisError {
        UndisError::Protocol(format!("unexpected reply: {}", line))
    }
}
