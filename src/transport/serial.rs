//! Serial port link.
//!
//! The device node is opened as a plain file. On Linux the port is switched
//! to raw mode at the requested baud rate through termios; elsewhere the
//! device's current line settings are used as-is.
//!
//! Writes are non-blocking with a deadline, so a wedged board surfaces as a
//! send error instead of stalling the dispatcher forever.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::ActuatorLink;

/// Longest a single send may wait for the device to accept bytes.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_RETRY: Duration = Duration::from_millis(5);

pub struct SerialLink {
    port: String,
    file: File,
}

impl SerialLink {
    /// Open `port`, configure it and wait `settle` before returning.
    pub fn open(port: &str, baud: u32, settle: Duration) -> Result<Self> {
        let file = open_device(port).with_context(|| format!("failed to open {}", port))?;
        configure_port(&file, baud).with_context(|| format!("failed to configure {}", port))?;
        if !settle.is_zero() {
            log::info!("waiting {:?} for {} to settle", settle, port);
            std::thread::sleep(settle);
        }
        log::info!("serial link open on {} at {} baud", port, baud);
        Ok(Self {
            port: port.to_string(),
            file,
        })
    }
}

impl ActuatorLink for SerialLink {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        write_all_before(&mut self.file, payload, WRITE_TIMEOUT)
            .with_context(|| format!("write to {} failed", self.port))
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// `write_all` for a non-blocking writer, giving up once `timeout` has passed.
fn write_all_before<W: Write>(writer: &mut W, mut buf: &[u8], timeout: Duration) -> io::Result<()> {
    let deadline = Instant::now() + timeout;
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "device accepted no bytes",
                ))
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("device stalled for {:?}", timeout),
                    ));
                }
                std::thread::sleep(WRITE_RETRY);
            }
            Err(e) => return Err(e),
        }
    }
    writer.flush()
}

#[cfg(target_os = "linux")]
fn open_device(port: &str) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(port)
}

#[cfg(not(target_os = "linux"))]
fn open_device(port: &str) -> std::io::Result<File> {
    OpenOptions::new().read(true).write(true).open(port)
}

#[cfg(target_os = "linux")]
fn configure_port(file: &File, baud: u32) -> Result<()> {
    use anyhow::anyhow;
    use std::os::unix::io::AsRawFd;

    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => return Err(anyhow!("unsupported baud rate {}", other)),
    };

    let fd = file.as_raw_fd();
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(anyhow!(std::io::Error::last_os_error())).context("tcgetattr failed");
    }
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0
        || unsafe { libc::cfsetospeed(&mut tio, speed) } != 0
    {
        return Err(anyhow!(std::io::Error::last_os_error())).context("cfsetspeed failed");
    }
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(anyhow!(std::io::Error::last_os_error())).context("tcsetattr failed");
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn configure_port(_file: &File, baud: u32) -> Result<()> {
    log::debug!("leaving line settings unchanged (requested {} baud)", baud);
    Ok(())
}
