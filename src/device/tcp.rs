//! WeatherLink IP transport.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Device;

/// A WeatherLink IP reached over TCP.
pub struct TcpDevice {
    stream: TcpStream,
    timeout: Duration,
}

impl TcpDevice {
    /// Establishes a TCP connection with a WeatherLink IP at
    /// `host:port`.  Every subsequent read and write carries the
    /// given deadline.
    pub fn dial(addr: &str, timeout: Duration) -> io::Result<Self> {
        let sock = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address"))?;
        let stream = TcpStream::connect_timeout(&sock, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        Ok(TcpDevice { stream, timeout })
    }
}

impl Device for TcpDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        // No lower level flush is available so read everything
        // pending with a short deadline and discard it.
        self.stream.set_read_timeout(Some(Duration::from_secs(1)))?;
        let mut scratch = [0u8; 8 * 1024];
        loop {
            match self.stream.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) if n < scratch.len() => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        self.stream.set_read_timeout(Some(self.timeout))?;

        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}
