//! Serial and USB data logger transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use super::Device;

/// Console link speed.
const BAUD_RATE: u32 = 19200;

/// A serial or USB data logger.
pub struct SerialDevice {
    port: Box<dyn SerialPort>,
}

impl SerialDevice {
    /// Opens a serial port connection at 19200 8N1 raw with the given
    /// read timeout.
    pub fn dial(addr: &str, timeout: Duration) -> io::Result<Self> {
        let port = serialport::new(addr, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(io::Error::from)?;

        Ok(SerialDevice { port })
    }
}

impl Device for SerialDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.port.read_exact(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn close(&mut self) -> io::Result<()> {
        // The port is released when the handle drops.
        Ok(())
    }
}
